//! In-memory remote cart store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use buybin::cart::Cart;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::identity::{Credential, UserId};

use super::{RemoteCartError, RemoteCartStore};

/// Remote cart store held in process memory.
///
/// Counts writes and can be switched offline, so the sign-in and
/// persistence paths can be exercised without a server.
#[derive(Debug, Default)]
pub struct InMemoryRemoteCartStore {
    carts: Mutex<FxHashMap<UserId, Cart>>,
    unavailable: AtomicBool,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryRemoteCartStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored cart for `user`.
    pub async fn insert(&self, user: UserId, cart: Cart) {
        self.carts.lock().await.insert(user, cart);
    }

    /// The cart currently stored for `user`.
    pub async fn cart(&self, user: &UserId) -> Option<Cart> {
        self.carts.lock().await.get(user).cloned()
    }

    /// Make every request fail with [`RemoteCartError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of successful deletes so far.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), RemoteCartError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteCartError::Unavailable);
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteCartStore for InMemoryRemoteCartStore {
    async fn fetch(
        &self,
        user: &UserId,
        _credential: &Credential,
    ) -> Result<Option<Cart>, RemoteCartError> {
        self.check_available()?;

        Ok(self.cart(user).await)
    }

    async fn save(
        &self,
        user: &UserId,
        _credential: &Credential,
        cart: &Cart,
    ) -> Result<(), RemoteCartError> {
        self.check_available()?;

        self.carts.lock().await.insert(user.clone(), cart.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn delete(
        &self,
        user: &UserId,
        _credential: &Credential,
    ) -> Result<(), RemoteCartError> {
        self.check_available()?;

        self.carts.lock().await.remove(user);
        self.deletes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn unknown_user_has_no_cart() -> TestResult {
        let store = InMemoryRemoteCartStore::new();

        let cart = store
            .fetch(&UserId::from("u1"), &Credential::new("t"))
            .await?;

        assert_eq!(cart, None);

        Ok(())
    }

    #[tokio::test]
    async fn offline_store_rejects_requests() {
        let store = InMemoryRemoteCartStore::new();
        store.set_unavailable(true);

        let result = store
            .save(&UserId::from("u1"), &Credential::new("t"), &Cart::new())
            .await;

        assert!(matches!(result, Err(RemoteCartError::Unavailable)));
        assert_eq!(store.save_count(), 0);
    }
}
