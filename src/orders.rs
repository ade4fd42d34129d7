//! Orders
//!
//! The order document written at checkout, built from the cart and the
//! session's pricing knobs.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    lines::CartLine,
    pricing::PricingPolicy,
    products::ProductId,
    summary::CartSummary,
};

/// Errors raised while drafting an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Orders need at least one line.
    #[error("cannot place an order for an empty cart")]
    EmptyCart,
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product identifier
    pub product_id: ProductId,

    /// Display title
    pub title: Option<String>,

    /// Price paid per unit
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Reference price per unit
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,

    /// Price paid per unit
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,

    /// Whether the unit price was discounted
    pub is_discounted: bool,

    /// Advertised discount percentage
    pub discount_percent: u8,

    /// Number of units
    pub quantity: u32,

    /// Display image
    pub image: Option<String>,

    /// Display category
    pub category: Option<String>,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id().clone(),
            title: line.title().map(str::to_string),
            price: line.unit_price(),
            original_price: line.list_price(),
            current_price: line.unit_price(),
            is_discounted: line.is_discounted(),
            discount_percent: line.discount_percent(),
            quantity: line.quantity(),
            image: line.image().map(str::to_string),
            category: line.category().map(str::to_string),
        }
    }
}

/// An order ready to be handed to the order store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Ordered products, in cart order
    pub items: Vec<OrderLine>,

    /// Sum of line totals
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,

    /// Applied discount percentage
    pub discount: u8,

    /// Amount taken off the subtotal
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,

    /// Shipping charged
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_cost: Decimal,

    /// Amount payable
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderDraft {
    /// Draft an order for the cart's current contents.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] if the cart has no lines.
    pub fn from_cart(cart: &Cart, policy: &PricingPolicy) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let summary = CartSummary::new(cart, policy);

        Ok(Self {
            items: cart.iter().map(OrderLine::from).collect(),
            subtotal: summary.subtotal(),
            discount: summary.discount().value(),
            discount_amount: summary.discount_amount(),
            shipping_cost: summary.shipping_cost(),
            total: summary.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use testresult::TestResult;

    use crate::{
        pricing::{DiscountPercent, ShippingOption},
        products::Product,
    };

    use super::*;

    #[test]
    fn empty_cart_cannot_be_ordered() {
        let result = OrderDraft::from_cart(&Cart::new(), &PricingPolicy::default());

        assert_eq!(result, Err(OrderError::EmptyCart));
    }

    #[test]
    fn draft_carries_lines_and_totals() -> TestResult {
        let mut cart = Cart::new();
        cart.add(
            &Product::new("a", Decimal::from(20))
                .with_original_price(Decimal::from(25))
                .with_discount_percent(20)
                .with_category("kitchen"),
            NonZeroU32::MIN,
        )?;

        let policy = PricingPolicy {
            discount: DiscountPercent::new(10)?,
            shipping: ShippingOption::Free,
        };

        let draft = OrderDraft::from_cart(&cart, &policy)?;

        assert_eq!(draft.items.len(), 1);
        let line = draft.items.first().ok_or("line missing")?;
        assert_eq!(line.product_id, ProductId::from("a"));
        assert_eq!(line.price, Decimal::from(20));
        assert_eq!(line.original_price, Decimal::from(25));
        assert!(line.is_discounted);
        assert_eq!(line.category.as_deref(), Some("kitchen"));
        assert_eq!(draft.subtotal, Decimal::from(20));
        assert_eq!(draft.discount, 10);
        assert_eq!(draft.discount_amount, Decimal::from(2));
        assert_eq!(draft.shipping_cost, Decimal::ZERO);
        assert_eq!(draft.total, Decimal::from(18));

        let json = serde_json::to_value(&draft)?;
        assert_eq!(json["items"][0]["productId"], "a");
        assert_eq!(json["shippingCost"], 0.0);

        Ok(())
    }
}
