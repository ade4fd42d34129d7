//! BuyBin
//!
//! Cart domain for the BuyBin storefront: cart lines captured from catalog
//! products, the guest/user cart merge, session pricing knobs and checkout
//! summaries. This crate performs no I/O; persistence and session handling
//! live in `buybin-app`.

pub mod cart;
pub mod lines;
pub mod merge;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod summary;
