//! Cart Lines

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::{Product, ProductError, ProductId};

/// Errors raised while decoding a stored cart line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineDecodeError {
    /// Neither `currentPrice` nor `price` was present.
    #[error("cart line {0} has no price")]
    MissingPrice(ProductId),
}

/// One product line in a cart.
///
/// Prices are captured when the product is added and are never refreshed
/// from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredLine", into = "StoredLine")]
pub struct CartLine {
    product_id: ProductId,
    quantity: u32,
    unit_price: Decimal,
    list_price: Decimal,
    is_discounted: bool,
    discount_percent: u8,
    title: Option<String>,
    image: Option<String>,
    category: Option<String>,
}

impl CartLine {
    /// Capture a product as a new cart line.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the product fails validation.
    pub fn from_product(product: &Product, quantity: NonZeroU32) -> Result<Self, ProductError> {
        product.validate()?;

        Ok(Self::capture(product, quantity))
    }

    /// Capture an already validated product.
    pub(crate) fn capture(product: &Product, quantity: NonZeroU32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity: quantity.get(),
            unit_price: product.current_price,
            list_price: product.list_price(),
            is_discounted: product.is_discounted,
            discount_percent: product.discount_percent,
            title: product.title.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
        }
    }

    /// Product this line is for.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Number of units.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Effective price per unit at the time the line was captured.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Reference price per unit before any catalog discount.
    pub fn list_price(&self) -> Decimal {
        self.list_price
    }

    /// Whether the line was captured at a discounted price.
    pub fn is_discounted(&self) -> bool {
        self.is_discounted
    }

    /// Advertised discount percentage, for display.
    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    /// Display title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Display image.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Display category.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub(crate) fn set_quantity(&mut self, quantity: NonZeroU32) {
        self.quantity = quantity.get();
    }

    pub(crate) fn add_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }
}

/// Stored representation of a cart line, as written by the storefront.
///
/// `price` is a legacy alias of `currentPrice`; both are written so older
/// readers keep working.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    id: ProductId,
    quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    current_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    original_price: Option<Decimal>,
    #[serde(default)]
    is_discounted: bool,
    #[serde(default)]
    discount_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

impl TryFrom<StoredLine> for CartLine {
    type Error = LineDecodeError;

    fn try_from(stored: StoredLine) -> Result<Self, Self::Error> {
        let unit_price = stored
            .current_price
            .or(stored.price)
            .ok_or_else(|| LineDecodeError::MissingPrice(stored.id.clone()))?;

        Ok(Self {
            product_id: stored.id,
            quantity: stored.quantity,
            unit_price,
            list_price: stored.original_price.unwrap_or(unit_price),
            is_discounted: stored.is_discounted,
            discount_percent: stored.discount_percent,
            title: stored.title,
            image: stored.image,
            category: stored.category,
        })
    }
}

impl From<CartLine> for StoredLine {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.product_id,
            quantity: line.quantity,
            price: Some(line.unit_price),
            current_price: Some(line.unit_price),
            original_price: Some(line.list_price),
            is_discounted: line.is_discounted,
            discount_percent: line.discount_percent,
            title: line.title,
            image: line.image,
            category: line.category,
        }
    }
}
