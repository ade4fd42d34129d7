//! Cart manager
//!
//! [`CartManager`] is a cloneable handle to a per-session actor that owns
//! the cart. Every mutation and sign-in/sign-out is queued and applied in
//! arrival order; writes to the guest or remote store run on a separate
//! worker so callers never wait on the network.

use std::{num::NonZeroU32, sync::Arc};

use buybin::{
    lines::CartLine,
    orders::{OrderDraft, OrderError},
    pricing::{
        DiscountError, DiscountPercent, PromoCodeError, ShippingError, ShippingOption,
        promo_discount,
    },
    products::{Product, ProductError, ProductId},
    summary::CartSummary,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{identity::SignedInUser, remote::RemoteCartStore, storage::GuestCartStore};

mod actor;
mod persist;
mod state;

use actor::{CartActor, Command};

pub use state::CartState;

/// Errors returned by [`CartManager`].
#[derive(Debug, Error)]
pub enum CartManagerError {
    /// The manager's actor is no longer running.
    #[error("cart manager has stopped")]
    Stopped,

    /// The product failed validation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// The discount was out of range.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The promotion code is not recognised.
    #[error(transparent)]
    PromoCode(#[from] PromoCodeError),

    /// The shipping cost matches no shipping option.
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

impl<T> From<mpsc::error::SendError<T>> for CartManagerError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Stopped
    }
}

impl From<oneshot::error::RecvError> for CartManagerError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Stopped
    }
}

/// Outcome of an identity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The session is bound to the user; the guest cart was merged into the
    /// account.
    SignedIn,

    /// The session is bound to the guest store again.
    SignedOut,

    /// Sign-in was aborted because the user's credential could not be
    /// obtained. The session is still a guest session.
    CredentialUnavailable,

    /// Sign-in was aborted because the account cart could not be read. The
    /// session is still a guest session.
    RemoteUnavailable,
}

/// Handle to a session's cart.
#[derive(Debug, Clone)]
pub struct CartManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<CartState>,
}

impl CartManager {
    /// Start a manager for a guest session. The guest cart is loaded in the
    /// background; commands sent meanwhile are applied once it is in place.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(guest: GuestCartStore, remote: Arc<dyn RemoteCartStore>) -> Self {
        let (publisher, state) = watch::channel(CartState::loading());
        let (commands, receiver) = mpsc::unbounded_channel();

        tokio::spawn(CartActor::new(guest, remote, publisher).run(receiver));

        Self { commands, state }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CartManagerError> {
        let (reply, response) = oneshot::channel();

        self.commands.send(command(reply))?;

        Ok(response.await?)
    }

    /// Latest published state.
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.clone()
    }

    /// Snapshot of the cart lines.
    pub fn cart_items(&self) -> Vec<CartLine> {
        self.state.borrow().items().to_vec()
    }

    /// True while the cart is being loaded or merged.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Applied promotion discount.
    pub fn discount(&self) -> DiscountPercent {
        self.state.borrow().discount()
    }

    /// Selected shipping option.
    pub fn shipping(&self) -> ShippingOption {
        self.state.borrow().shipping()
    }

    /// Cost of the selected shipping option.
    pub fn shipping_cost(&self) -> Decimal {
        self.state.borrow().shipping_cost()
    }

    /// Totals for the current cart and pricing knobs.
    pub fn summary(&self) -> CartSummary {
        let state = self.state.borrow();

        CartSummary::new(state.cart(), state.policy())
    }

    /// Draft the order document for the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] if the cart has no lines.
    pub fn order_draft(&self) -> Result<OrderDraft, OrderError> {
        let state = self.state.borrow();

        OrderDraft::from_cart(state.cart(), state.policy())
    }

    /// Wait until the initial load, or a running transition, has finished.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn loaded(&self) -> Result<CartState, CartManagerError> {
        let mut state = self.state.clone();
        let loaded = state
            .wait_for(|state| !state.is_loading())
            .await
            .map_err(|_closed| CartManagerError::Stopped)?;

        Ok(loaded.clone())
    }

    /// Add `quantity` of `product`. An existing line for the same product has
    /// its quantity increased and keeps its captured prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the product fails validation or the manager has
    /// stopped.
    pub async fn add_to_cart(
        &self,
        product: Product,
        quantity: NonZeroU32,
    ) -> Result<(), CartManagerError> {
        product.validate()?;

        self.request(|reply| Command::Add {
            product,
            quantity,
            reply,
        })
        .await??;

        Ok(())
    }

    /// Replace a line's quantity. A quantity below one or an unknown product
    /// leaves the cart untouched. Returns whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn update_quantity(
        &self,
        product_id: impl Into<ProductId>,
        quantity: u32,
    ) -> Result<bool, CartManagerError> {
        let product_id = product_id.into();

        self.request(|reply| Command::UpdateQuantity {
            product_id,
            quantity,
            reply,
        })
        .await
    }

    /// Remove a line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn remove_item(
        &self,
        product_id: impl Into<ProductId>,
    ) -> Result<bool, CartManagerError> {
        let product_id = product_id.into();

        self.request(|reply| Command::Remove { product_id, reply })
            .await
    }

    /// Empty the cart and reset the pricing knobs. The stored guest entry is
    /// removed, and for a signed-in session the account cart is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn clear_cart(&self) -> Result<(), CartManagerError> {
        self.request(|reply| Command::Clear { reply }).await
    }

    /// Apply a discount percentage.
    ///
    /// # Errors
    ///
    /// Returns an error if `percent` exceeds 100 or the manager has stopped.
    pub async fn set_discount(&self, percent: u8) -> Result<(), CartManagerError> {
        let discount = DiscountPercent::new(percent)?;

        self.request(|reply| Command::SetDiscount { discount, reply })
            .await
    }

    /// Apply a promotion code. An unknown code clears any applied discount.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::PromoCode`] for an unknown code, or
    /// [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn apply_promo_code(&self, code: &str) -> Result<DiscountPercent, CartManagerError> {
        let (discount, outcome) = match promo_discount(code) {
            Ok(discount) => (discount, Ok(discount)),
            Err(error) => (DiscountPercent::ZERO, Err(error.into())),
        };

        self.request(|reply| Command::SetDiscount { discount, reply })
            .await?;

        outcome
    }

    /// Select a shipping option.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn set_shipping(&self, shipping: ShippingOption) -> Result<(), CartManagerError> {
        self.request(|reply| Command::SetShipping { shipping, reply })
            .await
    }

    /// Select the shipping option with the given cost.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Shipping`] if no option costs `cost`.
    pub async fn set_shipping_cost(&self, cost: Decimal) -> Result<(), CartManagerError> {
        let shipping = ShippingOption::from_cost(cost)
            .ok_or_else(|| ShippingError::UnknownOption(cost.to_string()))?;

        self.set_shipping(shipping).await
    }

    /// Report an identity change: `Some(user)` on sign-in, `None` on
    /// sign-out. Resolves once the transition has finished.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn on_auth_change(
        &self,
        user: Option<SignedInUser>,
    ) -> Result<Transition, CartManagerError> {
        self.request(|reply| Command::AuthChanged { user, reply })
            .await
    }

    /// Wait until every write issued so far has reached its store.
    ///
    /// # Errors
    ///
    /// Returns [`CartManagerError::Stopped`] if the actor is gone.
    pub async fn flush(&self) -> Result<(), CartManagerError> {
        self.request(|reply| Command::Flush { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use buybin::cart::Cart;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        identity::{Credential, CredentialError, MockCredentialSource, UserId},
        remote::{MockRemoteCartStore, RemoteCartError},
        storage::{DEFAULT_CART_KEY, InMemoryKeyValueStore, KeyValueStore, MockKeyValueStore},
    };

    fn guest_store() -> (Arc<InMemoryKeyValueStore>, GuestCartStore) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let guest = GuestCartStore::new(store.clone(), DEFAULT_CART_KEY);

        (store, guest)
    }

    fn product(id: &str, price: i64) -> Product {
        Product::new(id, Decimal::from(price))
    }

    #[tokio::test]
    async fn guest_mutations_never_reach_the_remote_store() -> TestResult {
        let mut remote = MockRemoteCartStore::new();
        remote.expect_fetch().never();
        remote.expect_save().never();
        remote.expect_delete().never();

        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(remote));

        manager.add_to_cart(product("a", 3), NonZeroU32::MIN).await?;
        manager.update_quantity("a", 4).await?;
        manager.remove_item("a").await?;
        manager.add_to_cart(product("b", 1), NonZeroU32::MIN).await?;
        manager.clear_cart().await?;
        manager.flush().await?;

        assert!(manager.cart_items().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn user_mutations_never_write_the_guest_entry() -> TestResult {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_remove().once().returning(|_| Ok(()));
        store.expect_set().never();

        let mut remote = MockRemoteCartStore::new();
        remote.expect_fetch().once().returning(|_, _| Ok(None));
        remote.expect_save().times(3).returning(|_, _, _| Ok(()));

        let guest = GuestCartStore::new(Arc::new(store), DEFAULT_CART_KEY);
        let manager = CartManager::spawn(guest, Arc::new(remote));

        let transition = manager
            .on_auth_change(Some(SignedInUser::with_token("u1", "t")))
            .await?;
        assert_eq!(transition, Transition::SignedIn);

        manager.add_to_cart(product("a", 3), NonZeroU32::MIN).await?;
        manager.update_quantity("a", 2).await?;
        manager.flush().await?;

        Ok(())
    }

    #[tokio::test]
    async fn quantity_below_one_is_ignored() -> TestResult {
        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(MockRemoteCartStore::new()));

        manager.add_to_cart(product("a", 3), NonZeroU32::MIN).await?;

        assert!(!manager.update_quantity("a", 0).await?);
        assert_eq!(
            manager.cart_items().first().map(CartLine::quantity),
            Some(1)
        );

        Ok(())
    }

    #[tokio::test]
    async fn invalid_product_is_rejected_before_the_queue() -> TestResult {
        let (store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(MockRemoteCartStore::new()));

        let result = manager
            .add_to_cart(product("a", -1), NonZeroU32::MIN)
            .await;

        assert!(matches!(result, Err(CartManagerError::Product(_))));

        manager.flush().await?;
        assert_eq!(store.get(DEFAULT_CART_KEY).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn credential_failure_keeps_the_guest_session() -> TestResult {
        let mut credentials = MockCredentialSource::new();
        credentials
            .expect_credential()
            .once()
            .returning(|| Err(CredentialError::Unavailable("expired".to_string())));

        let mut remote = MockRemoteCartStore::new();
        remote.expect_fetch().never();
        remote.expect_save().never();

        let (store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(remote));
        manager.add_to_cart(product("a", 3), NonZeroU32::MIN).await?;

        let user = SignedInUser::new(UserId::from("u1"), Arc::new(credentials));
        let transition = manager.on_auth_change(Some(user)).await?;

        assert_eq!(transition, Transition::CredentialUnavailable);

        let state = manager.state();
        assert_eq!(state.user(), None);
        assert!(!state.is_loading());
        assert_eq!(state.cart().len(), 1);
        assert!(store.get(DEFAULT_CART_KEY).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn unreadable_account_cart_aborts_sign_in() -> TestResult {
        let mut remote = MockRemoteCartStore::new();
        remote.expect_fetch().once().returning(|_, _| {
            Err(RemoteCartError::UnexpectedStatus {
                status: 500,
                body: String::new(),
            })
        });
        remote.expect_save().never();

        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(remote));
        manager.add_to_cart(product("a", 3), NonZeroU32::MIN).await?;

        let transition = manager
            .on_auth_change(Some(SignedInUser::with_token("u1", "t")))
            .await?;

        assert_eq!(transition, Transition::RemoteUnavailable);
        assert_eq!(manager.state().user(), None);
        assert_eq!(manager.cart_items().len(), 1);

        Ok(())
    }

    /// Account store whose fetch waits until the test opens the gate.
    struct GatedRemote {
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl RemoteCartStore for GatedRemote {
        async fn fetch(
            &self,
            _user: &UserId,
            _credential: &Credential,
        ) -> Result<Option<Cart>, RemoteCartError> {
            if let Some(gate) = self.gate.lock().await.take() {
                gate.await.map_err(|_closed| RemoteCartError::Unavailable)?;
            }

            Ok(None)
        }

        async fn save(
            &self,
            _user: &UserId,
            _credential: &Credential,
            _cart: &Cart,
        ) -> Result<(), RemoteCartError> {
            Ok(())
        }

        async fn delete(
            &self,
            _user: &UserId,
            _credential: &Credential,
        ) -> Result<(), RemoteCartError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn loading_is_published_while_signing_in() -> TestResult {
        let (release, gate) = oneshot::channel();
        let remote = GatedRemote {
            gate: tokio::sync::Mutex::new(Some(gate)),
        };

        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(remote));
        manager.loaded().await?;

        let mut states = manager.subscribe();
        let signing_in = tokio::spawn({
            let manager = manager.clone();
            async move {
                manager
                    .on_auth_change(Some(SignedInUser::with_token("u1", "t")))
                    .await
            }
        });

        states.wait_for(CartState::is_loading).await?;
        assert!(manager.is_loading());
        assert_eq!(manager.state().user(), None);

        release.send(()).map_err(|()| "gate closed")?;

        assert_eq!(signing_in.await??, Transition::SignedIn);
        assert!(!manager.is_loading());
        assert_eq!(manager.state().user(), Some(&UserId::from("u1")));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_promo_code_resets_the_discount() -> TestResult {
        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(MockRemoteCartStore::new()));

        assert_eq!(manager.apply_promo_code("save10").await?.value(), 10);
        assert_eq!(manager.discount().value(), 10);

        let result = manager.apply_promo_code("BOGUS").await;

        assert!(matches!(result, Err(CartManagerError::PromoCode(_))));
        assert_eq!(manager.discount(), DiscountPercent::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn shipping_cost_selects_a_known_option() -> TestResult {
        let (_store, guest) = guest_store();
        let manager = CartManager::spawn(guest, Arc::new(MockRemoteCartStore::new()));

        manager.set_shipping_cost(Decimal::from(10)).await?;
        assert_eq!(manager.shipping(), ShippingOption::Express);

        let result = manager.set_shipping_cost(Decimal::from(7)).await;
        assert!(matches!(result, Err(CartManagerError::Shipping(_))));
        assert_eq!(manager.shipping(), ShippingOption::Express);

        Ok(())
    }

    #[tokio::test]
    async fn loads_the_stored_guest_cart_on_start() -> TestResult {
        let (store, guest) = guest_store();
        let mut cart = Cart::new();
        cart.add(&product("a", 2), NonZeroU32::MIN)?;
        guest.save(&cart).await?;

        let manager = CartManager::spawn(guest, Arc::new(MockRemoteCartStore::new()));
        let state = manager.loaded().await?;

        assert_eq!(state.cart(), &cart);
        assert!(store.get(DEFAULT_CART_KEY).await?.is_some());

        Ok(())
    }

    #[test]
    fn stopped_errors_map_from_closed_channels() {
        let (sender, receiver) = oneshot::channel::<()>();
        drop(sender);

        let error = receiver.blocking_recv().map_err(CartManagerError::from);

        assert!(matches!(error, Err(CartManagerError::Stopped)));
    }
}
