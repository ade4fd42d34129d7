//! Session cart manager for the BuyBin storefront.
//!
//! A [`manager::CartManager`] owns the active session's cart, persists it to
//! the guest store or the account's remote store depending on who is signed
//! in, and merges the guest cart into the account on sign-in.

pub mod config;
pub mod context;
pub mod identity;
pub mod manager;
pub mod observability;
pub mod remote;
pub mod storage;
