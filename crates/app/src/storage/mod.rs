//! Local persistent storage
//!
//! A per-device key-value store, the equivalent of the browser's local
//! storage, and the guest cart kept in it.

use std::io;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod file;
mod guest;
mod memory;

pub use file::FileKeyValueStore;
pub use guest::{DEFAULT_CART_KEY, GuestCartError, GuestCartStore};
pub use memory::InMemoryKeyValueStore;

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum KeyValueStoreError {
    /// The key cannot be mapped onto the backing storage.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    /// The backing storage failed.
    #[error("storage I/O error")]
    Io(#[from] io::Error),
}

/// String key-value storage local to this device.
#[automock]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Remove the value stored under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}
