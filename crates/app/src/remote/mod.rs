//! Remote cart store
//!
//! Account carts, keyed by user id, held by the storefront's cart API.

use async_trait::async_trait;
use buybin::cart::Cart;
use mockall::automock;
use thiserror::Error;

use crate::identity::{Credential, UserId};

mod http;
mod memory;

pub use http::HttpCartStore;
pub use memory::InMemoryRemoteCartStore;

/// Errors raised by a remote cart store.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// The request could not be sent, timed out, or the body was unreadable.
    #[error("remote cart request failed")]
    Http(#[from] reqwest::Error),

    /// The store answered with a status other than success.
    #[error("remote cart store returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,

        /// Response body, for diagnostics
        body: String,
    },

    /// The configured base URL cannot carry a request path.
    #[error("invalid cart API base URL: {0}")]
    InvalidBaseUrl(String),

    /// The store is not reachable.
    #[error("remote cart store unavailable")]
    Unavailable,
}

/// Account cart storage, authenticated with the user's bearer credential.
#[automock]
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Fetch the user's cart. Returns `None` when the user has no stored
    /// cart.
    async fn fetch(
        &self,
        user: &UserId,
        credential: &Credential,
    ) -> Result<Option<Cart>, RemoteCartError>;

    /// Replace the user's stored cart.
    async fn save(
        &self,
        user: &UserId,
        credential: &Credential,
        cart: &Cart,
    ) -> Result<(), RemoteCartError>;

    /// Delete the user's stored cart.
    async fn delete(&self, user: &UserId, credential: &Credential)
    -> Result<(), RemoteCartError>;
}
