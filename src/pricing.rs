//! Pricing
//!
//! Session-scoped pricing knobs: the percentage discount from a promotion
//! code and the selected shipping option.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a discount percentage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// The percentage is above 100.
    #[error("discount of {0}% is out of range, expected 0-100")]
    OutOfRange(u8),
}

/// Errors raised when applying a promotion code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoCodeError {
    /// The code is not a known promotion.
    #[error("invalid promo code {0:?}")]
    Unknown(String),
}

/// Errors raised when parsing a shipping option.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShippingError {
    /// The name does not match any shipping option.
    #[error("unknown shipping option {0:?}, expected standard, express or free")]
    UnknownOption(String),
}

/// A whole-number discount percentage between 0 and 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// No discount.
    pub const ZERO: Self = Self(0);

    /// Create a discount percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::OutOfRange`] if `percent` is above 100.
    pub fn new(percent: u8) -> Result<Self, DiscountError> {
        if percent > 100 {
            return Err(DiscountError::OutOfRange(percent));
        }

        Ok(Self(percent))
    }

    /// The percentage as a whole number.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Amount taken off `amount` by this discount.
    pub fn of(self, amount: Decimal) -> Decimal {
        amount * Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<u8> for DiscountPercent {
    type Error = DiscountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for u8 {
    fn from(value: DiscountPercent) -> Self {
        value.0
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Look up the discount granted by a promotion code.
///
/// Codes are matched case-insensitively, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`PromoCodeError::Unknown`] if the code is not recognised.
pub fn promo_discount(code: &str) -> Result<DiscountPercent, PromoCodeError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "SAVE10" => Ok(DiscountPercent(10)),
        "WELCOME20" => Ok(DiscountPercent(20)),
        _ => Err(PromoCodeError::Unknown(code.to_string())),
    }
}

/// Shipping options offered at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingOption {
    /// Standard delivery, 3-5 days.
    #[default]
    Standard,

    /// Express delivery, 1-2 days.
    Express,

    /// Free delivery, 7-10 days.
    Free,
}

impl ShippingOption {
    /// Every option, in the order they are offered.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Express, Self::Free];

    /// Cost of the option.
    pub fn cost(self) -> Decimal {
        match self {
            Self::Standard => Decimal::new(500, 2),
            Self::Express => Decimal::new(1000, 2),
            Self::Free => Decimal::ZERO,
        }
    }

    /// Human readable label including the delivery window.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard (3-5 days)",
            Self::Express => "Express (1-2 days)",
            Self::Free => "Free (7-10 days)",
        }
    }

    /// Find the option with the given cost.
    pub fn from_cost(cost: Decimal) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.cost() == cost)
    }
}

impl FromStr for ShippingOption {
    type Err = ShippingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "free" => Ok(Self::Free),
            _ => Err(ShippingError::UnknownOption(s.to_string())),
        }
    }
}

impl fmt::Display for ShippingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pricing knobs applied to a whole cart for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Discount from an applied promotion code
    pub discount: DiscountPercent,

    /// Selected shipping option
    pub shipping: ShippingOption,
}

impl PricingPolicy {
    /// Restore the default knobs: no discount, standard shipping.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Cost of the selected shipping option.
    pub fn shipping_cost(&self) -> Decimal {
        self.shipping.cost()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discount_percent_rejects_values_above_one_hundred() {
        assert_eq!(DiscountPercent::new(101), Err(DiscountError::OutOfRange(101)));
        assert!(DiscountPercent::new(100).is_ok());
    }

    #[test]
    fn discount_percent_of_amount() -> TestResult {
        let discount = DiscountPercent::new(10)?;

        assert_eq!(discount.of(Decimal::new(4999, 2)), Decimal::new(4999, 3));

        Ok(())
    }

    #[test]
    fn promo_codes_are_case_insensitive() -> TestResult {
        assert_eq!(promo_discount("save10")?.value(), 10);
        assert_eq!(promo_discount(" Welcome20 ")?.value(), 20);

        Ok(())
    }

    #[test]
    fn unknown_promo_code_is_rejected() {
        assert_eq!(
            promo_discount("FREESTUFF"),
            Err(PromoCodeError::Unknown("FREESTUFF".to_string()))
        );
    }

    #[test]
    fn shipping_defaults_to_standard() {
        assert_eq!(ShippingOption::default(), ShippingOption::Standard);
        assert_eq!(PricingPolicy::default().shipping_cost(), Decimal::new(500, 2));
    }

    #[test]
    fn shipping_from_cost_matches_offered_options() {
        assert_eq!(
            ShippingOption::from_cost(Decimal::from(10)),
            Some(ShippingOption::Express)
        );
        assert_eq!(ShippingOption::from_cost(Decimal::ZERO), Some(ShippingOption::Free));
        assert_eq!(ShippingOption::from_cost(Decimal::from(7)), None);
    }

    #[test]
    fn shipping_parses_from_name() -> TestResult {
        assert_eq!("Express".parse::<ShippingOption>()?, ShippingOption::Express);
        assert!("overnight".parse::<ShippingOption>().is_err());

        Ok(())
    }

    #[test]
    fn reset_restores_defaults() -> TestResult {
        let mut policy = PricingPolicy {
            discount: DiscountPercent::new(20)?,
            shipping: ShippingOption::Free,
        };

        policy.reset();

        assert_eq!(policy, PricingPolicy::default());

        Ok(())
    }
}
