//! BuyBin prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartDocument},
    lines::{CartLine, LineDecodeError},
    merge::merge_carts,
    orders::{OrderDraft, OrderError, OrderLine},
    pricing::{
        DiscountError, DiscountPercent, PricingPolicy, PromoCodeError, ShippingError,
        ShippingOption, promo_discount,
    },
    products::{Product, ProductError, ProductId},
    summary::{CartSummary, SummaryError, format_money, round_money},
};
