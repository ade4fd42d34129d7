//! Guest cart persistence.

use std::{fmt, sync::Arc};

use buybin::cart::{Cart, CartDocument};
use thiserror::Error;
use tracing::{debug, warn};

use super::{KeyValueStore, KeyValueStoreError};

/// Key the storefront keeps the guest cart under.
pub const DEFAULT_CART_KEY: &str = "buybin_cart";

/// Errors raised while saving the guest cart.
#[derive(Debug, Error)]
pub enum GuestCartError {
    /// The cart could not be encoded.
    #[error("failed to encode guest cart")]
    Encode(#[from] serde_json::Error),

    /// The key-value store failed.
    #[error(transparent)]
    Store(#[from] KeyValueStoreError),
}

/// The guest cart, stored as a `{ "cartItems": [...] }` document under a
/// fixed key.
#[derive(Clone)]
pub struct GuestCartStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl GuestCartStore {
    /// Keep the guest cart under `key` in `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the guest cart.
    ///
    /// A missing, unreadable or malformed entry is treated as an empty cart;
    /// the failure is logged and never surfaced.
    pub async fn load(&self) -> Cart {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(error) => {
                warn!(key = %self.key, %error, "failed to read guest cart");
                return Cart::new();
            }
        };

        match serde_json::from_str::<Option<CartDocument>>(&raw) {
            Ok(Some(document)) => {
                if document.skipped_lines() > 0 {
                    warn!(
                        key = %self.key,
                        skipped = document.skipped_lines(),
                        "dropped undecodable guest cart lines"
                    );
                }

                Cart::from(document)
            }
            Ok(None) => Cart::new(),
            Err(error) => {
                warn!(key = %self.key, %error, "ignoring malformed guest cart");
                Cart::new()
            }
        }
    }

    /// Overwrite the stored guest cart.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] if encoding or the store write fails.
    pub async fn save(&self, cart: &Cart) -> Result<(), GuestCartError> {
        let raw = serde_json::to_string(&CartDocument::from(cart))?;

        self.store.set(&self.key, &raw).await?;

        debug!(key = %self.key, lines = cart.len(), "saved guest cart");

        Ok(())
    }

    /// Remove the stored guest cart.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyValueStoreError`] if the store fails.
    pub async fn clear(&self) -> Result<(), KeyValueStoreError> {
        self.store.remove(&self.key).await?;

        debug!(key = %self.key, "cleared guest cart");

        Ok(())
    }
}

impl fmt::Debug for GuestCartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestCartStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
