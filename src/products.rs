//! Products
//!
//! The attributes a catalog product must carry to be added to a cart. The
//! cart trusts these values as given and never re-validates them against the
//! catalog; only their shape is checked.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque product identifier, unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Errors raised when product input is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    /// The product identifier is empty or whitespace.
    #[error("product id must not be empty")]
    EmptyId,

    /// One of the product's prices is below zero.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),

    /// The advertised discount percentage is above 100.
    #[error("product {id} has discount percent {percent}, expected 0-100")]
    DiscountOutOfRange {
        /// Offending product
        id: ProductId,

        /// Rejected percentage
        percent: u8,
    },
}

/// Product attributes captured when a product is added to a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Effective (possibly discounted) price
    pub current_price: Decimal,

    /// Pre-discount reference price, when the catalog has one
    pub original_price: Option<Decimal>,

    /// Whether the catalog marks this product as discounted
    pub is_discounted: bool,

    /// Advertised discount, for display only
    pub discount_percent: u8,

    /// Display title
    pub title: Option<String>,

    /// Display image URL
    pub image: Option<String>,

    /// Display category
    pub category: Option<String>,
}

impl Product {
    /// Create a product with an id and price and no display metadata.
    pub fn new(id: impl Into<ProductId>, current_price: Decimal) -> Self {
        Self {
            id: id.into(),
            current_price,
            original_price: None,
            is_discounted: false,
            discount_percent: 0,
            title: None,
            image: None,
            category: None,
        }
    }

    /// Set the pre-discount price. The product is flagged as discounted when
    /// the original price is above the current one.
    #[must_use]
    pub fn with_original_price(mut self, original_price: Decimal) -> Self {
        self.is_discounted = original_price > self.current_price;
        self.original_price = Some(original_price);
        self
    }

    /// Set the advertised discount percentage.
    #[must_use]
    pub fn with_discount_percent(mut self, percent: u8) -> Self {
        self.discount_percent = percent;
        self
    }

    /// Set the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the display image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the display category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The reference price used as a cart line's list price.
    pub fn list_price(&self) -> Decimal {
        self.original_price.unwrap_or(self.current_price)
    }

    /// Check the product can be captured as a cart line.
    ///
    /// # Errors
    ///
    /// - [`ProductError::EmptyId`]: the id is empty or whitespace.
    /// - [`ProductError::NegativePrice`]: a price is below zero.
    /// - [`ProductError::DiscountOutOfRange`]: the discount is above 100.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ProductError::EmptyId);
        }

        if self.current_price.is_sign_negative() || self.list_price().is_sign_negative() {
            return Err(ProductError::NegativePrice(self.id.clone()));
        }

        if self.discount_percent > 100 {
            return Err(ProductError::DiscountOutOfRange {
                id: self.id.clone(),
                percent: self.discount_percent,
            });
        }

        Ok(())
    }
}
