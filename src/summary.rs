//! Checkout Summary

use std::io;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::Cart,
    lines::CartLine,
    pricing::{DiscountPercent, PricingPolicy, ShippingOption},
};

/// Errors raised while rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// An amount could not be represented in the currency's minor units.
    #[error("amount {0} cannot be represented in minor units")]
    AmountOutOfRange(Decimal),

    /// Writing the rendered summary failed.
    #[error("failed to write summary")]
    Io(#[source] io::Error),
}

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    item_count: u64,
    subtotal: Decimal,
    discount: DiscountPercent,
    discount_amount: Decimal,
    shipping: ShippingOption,
    total: Decimal,
}

impl CartSummary {
    /// Calculate totals for a cart under the session's pricing policy.
    ///
    /// Shipping is charged on the discounted subtotal and every amount is
    /// rounded to two decimal places.
    pub fn new(cart: &Cart, policy: &PricingPolicy) -> Self {
        let subtotal = round_money(cart.subtotal());
        let discount_amount = round_money(policy.discount.of(subtotal));
        let total = round_money(subtotal - discount_amount + policy.shipping_cost());

        Self {
            item_count: cart.item_count(),
            subtotal,
            discount: policy.discount,
            discount_amount,
            shipping: policy.shipping,
            total,
        }
    }

    /// Total number of units across every line. A line with quantity three
    /// counts as three items.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Sum of line totals before discount and shipping.
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Applied discount percentage.
    pub fn discount(&self) -> DiscountPercent {
        self.discount
    }

    /// Amount taken off the subtotal.
    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Selected shipping option.
    pub fn shipping(&self) -> ShippingOption {
        self.shipping
    }

    /// Shipping cost.
    pub fn shipping_cost(&self) -> Decimal {
        self.shipping.cost()
    }

    /// Amount payable.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Render the cart lines and totals as a table.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if an amount cannot be formatted or the
    /// output cannot be written.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        cart: &Cart,
        currency: &'static Currency,
    ) -> Result<(), SummaryError> {
        if cart.is_empty() {
            return writeln!(out, "Your cart is empty.").map_err(SummaryError::Io);
        }

        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Unit Price", "Was", "Line Total"]);

        for line in cart {
            builder.push_record(line_row(line, currency)?);
        }

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..5), Alignment::right());

        writeln!(out, "{table}").map_err(SummaryError::Io)?;

        let item_label = if self.item_count == 1 { "item" } else { "items" };
        let mut rows = vec![(
            format!("Subtotal ({} {item_label})", self.item_count),
            format_money(self.subtotal, currency)?,
        )];

        if self.discount > DiscountPercent::ZERO {
            rows.push((
                format!("Discount ({})", self.discount),
                format!("-{}", format_money(self.discount_amount, currency)?),
            ));
        }

        rows.push((
            format!("Shipping, {}", self.shipping),
            format_money(self.shipping_cost(), currency)?,
        ));
        rows.push(("Total".to_string(), format_money(self.total, currency)?));

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        for (label, value) in rows {
            writeln!(out, " {label:<label_width$}  {value:>10}").map_err(SummaryError::Io)?;
        }

        Ok(())
    }
}

fn line_row(line: &CartLine, currency: &'static Currency) -> Result<[String; 5], SummaryError> {
    let name = line
        .title()
        .map_or_else(|| line.product_id().to_string(), str::to_string);

    let was = if line.is_discounted() && line.list_price() > line.unit_price() {
        format_money(line.list_price(), currency)?
    } else {
        String::new()
    };

    Ok([
        name,
        line.quantity().to_string(),
        format_money(line.unit_price(), currency)?,
        was,
        format_money(line.line_total(), currency)?,
    ])
}

/// Round an amount to pennies/cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount in the given currency, e.g. `£9.99`.
///
/// # Errors
///
/// Returns [`SummaryError::AmountOutOfRange`] if the amount does not fit in
/// the currency's minor units.
pub fn format_money(amount: Decimal, currency: &'static Currency) -> Result<String, SummaryError> {
    let scale = Decimal::from(10_u64.pow(currency.exponent));

    let minor = (amount * scale)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(SummaryError::AmountOutOfRange(amount))?;

    Ok(Money::from_minor(minor, currency).to_string())
}
