//! Observable manager state.

use buybin::{
    cart::Cart,
    lines::CartLine,
    pricing::{DiscountPercent, PricingPolicy, ShippingOption},
};
use rust_decimal::Decimal;

use crate::identity::{SignedInUser, UserId};

/// Snapshot of the session cart, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct CartState {
    pub(super) cart: Cart,
    pub(super) user: Option<UserId>,
    pub(super) policy: PricingPolicy,
    pub(super) loading: bool,
    pub(super) generation: u64,
}

impl CartState {
    pub(super) fn loading() -> Self {
        Self {
            cart: Cart::new(),
            user: None,
            policy: PricingPolicy::default(),
            loading: true,
            generation: 0,
        }
    }

    /// The session cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The cart's lines, in insertion order.
    pub fn items(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// The signed-in user, or `None` for a guest session.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Session pricing knobs.
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Applied promotion discount.
    pub fn discount(&self) -> DiscountPercent {
        self.policy.discount
    }

    /// Selected shipping option.
    pub fn shipping(&self) -> ShippingOption {
        self.policy.shipping
    }

    /// Cost of the selected shipping option.
    pub fn shipping_cost(&self) -> Decimal {
        self.policy.shipping_cost()
    }

    /// True while the cart is being loaded or merged.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of binding transitions applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Where the session cart is persisted.
#[derive(Debug, Clone)]
pub(super) enum Binding {
    Guest,
    User(SignedInUser),
}

impl Binding {
    pub(super) fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::User(user) => Some(user.id()),
        }
    }
}
