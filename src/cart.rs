//! Cart

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, de::IgnoredAny};

use crate::{
    lines::CartLine,
    products::{Product, ProductError, ProductId},
};

/// Ordered collection of cart lines with at most one line per product.
///
/// Line order is the order products were first added and only matters for
/// display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from previously stored lines.
    ///
    /// Lines sharing a product id are folded into the first occurrence and
    /// zero-quantity lines are dropped, so the result always upholds the
    /// one-line-per-product invariant.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        let mut positions = FxHashMap::default();

        for line in lines {
            if line.quantity() == 0 {
                continue;
            }

            cart.absorb(line, &mut positions);
        }

        cart
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the product has its quantity increased and keeps
    /// the prices it was captured with; otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the product fails validation.
    pub fn add(&mut self, product: &Product, quantity: NonZeroU32) -> Result<(), ProductError> {
        product.validate()?;

        if let Some(line) = self.line_mut(&product.id) {
            line.add_quantity(quantity.get());
        } else {
            self.lines.push(CartLine::capture(product, quantity));
        }

        Ok(())
    }

    /// Replace the quantity of a line.
    ///
    /// A quantity of zero is ignored rather than removing the line. Returns
    /// whether the cart changed.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return false;
        };

        match self.line_mut(product_id) {
            Some(line) if line.quantity() != quantity.get() => {
                line.set_quantity(quantity);
                true
            }
            _ => false,
        }
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();

        self.lines.retain(|line| line.product_id() != product_id);

        self.lines.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Find the line for a product.
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == product_id)
    }

    /// Lines in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Iterate over lines in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Consume the cart, returning its lines.
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Sum of line totals at captured unit prices.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Fold a line into the cart, tracking line positions by product id.
    pub(crate) fn absorb(&mut self, line: CartLine, positions: &mut FxHashMap<ProductId, usize>) {
        if let Some(existing) = positions
            .get(line.product_id())
            .and_then(|&idx| self.lines.get_mut(idx))
        {
            existing.add_quantity(line.quantity());
            return;
        }

        positions.insert(line.product_id().clone(), self.lines.len());
        self.lines.push(line);
    }

    pub(crate) fn positions(&self) -> FxHashMap<ProductId, usize> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (line.product_id().clone(), idx))
            .collect()
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id() == product_id)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Stored form of a cart: `{ "cartItems": [...] }`.
///
/// Decoding is lenient, like the storefront's own reader: a missing or
/// `null` `cartItems` is an empty cart, and lines that cannot be decoded
/// are skipped and counted in [`CartDocument::skipped_lines`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredDocument")]
pub struct CartDocument {
    /// Cart lines in display order
    pub cart_items: Vec<CartLine>,

    #[serde(skip)]
    skipped_lines: usize,
}

impl CartDocument {
    /// Number of stored lines dropped while decoding because they were not
    /// valid cart lines.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Line(CartLine),
    Invalid(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default)]
    cart_items: Option<Vec<StoredEntry>>,
}

impl From<StoredDocument> for CartDocument {
    fn from(stored: StoredDocument) -> Self {
        let mut document = Self::default();

        for entry in stored.cart_items.unwrap_or_default() {
            match entry {
                StoredEntry::Line(line) => document.cart_items.push(line),
                StoredEntry::Invalid(_) => document.skipped_lines += 1,
            }
        }

        document
    }
}

impl From<&Cart> for CartDocument {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_items: cart.lines.clone(),
            skipped_lines: 0,
        }
    }
}

impl From<CartDocument> for Cart {
    fn from(document: CartDocument) -> Self {
        Cart::from_lines(document.cart_items)
    }
}
