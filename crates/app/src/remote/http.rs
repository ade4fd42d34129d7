//! HTTP client for the storefront cart API.

use std::time::Duration;

use async_trait::async_trait;
use buybin::{
    cart::{Cart, CartDocument},
    lines::CartLine,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::identity::{Credential, UserId};

use super::{RemoteCartError, RemoteCartStore};

/// Body of `POST /api/cart/save`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveCartBody<'a> {
    user_id: &'a UserId,
    cart_items: &'a [CartLine],
}

/// Remote cart store backed by the storefront's cart API.
///
/// - `GET {base}/api/cart/{user}` returns `{ "cartItems": [...] }`
/// - `POST {base}/api/cart/save` upserts `{ "userId", "cartItems" }`
/// - `DELETE {base}/api/cart/{user}` clears the cart
///
/// User ids are percent-encoded as a single path segment.
#[derive(Debug, Clone)]
pub struct HttpCartStore {
    base_url: Url,
    http: Client,
}

impl HttpCartStore {
    /// Create a client for the API at `base_url`. Every request is bounded
    /// by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or `base_url`
    /// cannot carry a path.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, RemoteCartError> {
        let http = Client::builder().timeout(timeout).build()?;

        Self::with_client(base_url, http)
    }

    /// Create a store using an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCartError::InvalidBaseUrl`] if `base_url` cannot carry
    /// a path, such as a `mailto:` or `data:` URL.
    pub fn with_client(base_url: Url, http: Client) -> Result<Self, RemoteCartError> {
        if base_url.cannot_be_a_base() {
            return Err(RemoteCartError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self { base_url, http })
    }

    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, RemoteCartError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| RemoteCartError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn cart_url(&self, user: &UserId) -> Result<Url, RemoteCartError> {
        self.endpoint(["api", "cart", user.as_str()])
    }

    fn fetch_request(
        &self,
        user: &UserId,
        credential: &Credential,
    ) -> Result<RequestBuilder, RemoteCartError> {
        Ok(self
            .http
            .get(self.cart_url(user)?)
            .bearer_auth(credential.expose()))
    }

    fn save_request(
        &self,
        user: &UserId,
        credential: &Credential,
        cart: &Cart,
    ) -> Result<RequestBuilder, RemoteCartError> {
        let body = SaveCartBody {
            user_id: user,
            cart_items: cart.lines(),
        };

        Ok(self
            .http
            .post(self.endpoint(["api", "cart", "save"])?)
            .bearer_auth(credential.expose())
            .json(&body))
    }

    fn delete_request(
        &self,
        user: &UserId,
        credential: &Credential,
    ) -> Result<RequestBuilder, RemoteCartError> {
        Ok(self
            .http
            .delete(self.cart_url(user)?)
            .bearer_auth(credential.expose()))
    }
}

async fn unexpected_status(response: Response) -> RemoteCartError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    RemoteCartError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl RemoteCartStore for HttpCartStore {
    async fn fetch(
        &self,
        user: &UserId,
        credential: &Credential,
    ) -> Result<Option<Cart>, RemoteCartError> {
        let response = self.fetch_request(user, credential)?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(user_id = %user, "no remote cart stored");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }

        let Some(document) = response.json::<Option<CartDocument>>().await? else {
            debug!(user_id = %user, "remote cart is null");
            return Ok(Some(Cart::new()));
        };

        if document.skipped_lines() > 0 {
            warn!(
                user_id = %user,
                skipped = document.skipped_lines(),
                "dropped undecodable remote cart lines"
            );
        }

        Ok(Some(Cart::from(document)))
    }

    async fn save(
        &self,
        user: &UserId,
        credential: &Credential,
        cart: &Cart,
    ) -> Result<(), RemoteCartError> {
        let response = self.save_request(user, credential, cart)?.send().await?;

        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }

        Ok(())
    }

    async fn delete(
        &self,
        user: &UserId,
        credential: &Credential,
    ) -> Result<(), RemoteCartError> {
        let response = self.delete_request(user, credential)?.send().await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(unexpected_status(response).await);
        }

        Ok(())
    }
}
