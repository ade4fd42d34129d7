//! Cart Merge
//!
//! Reconciles the cart a shopper built while signed out with the cart stored
//! against their account.

use crate::cart::Cart;

/// Merge a guest cart into a user's stored cart.
///
/// The stored (remote) lines come first, in their existing order. Each guest
/// line is then folded in, in guest order: a product already present has its
/// quantity increased and keeps the stored prices, anything else is appended
/// with the guest line's own prices.
pub fn merge_carts(local: Cart, remote: Cart) -> Cart {
    if local.is_empty() {
        return remote;
    }

    let mut positions = remote.positions();
    let mut merged = remote;

    for line in local.into_lines() {
        merged.absorb(line, &mut positions);
    }

    merged
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::products::{Product, ProductId};

    use super::*;

    fn cart(lines: &[(&str, u32, i64)]) -> Result<Cart, Box<dyn std::error::Error>> {
        let mut cart = Cart::new();

        for &(id, quantity, price) in lines {
            let quantity = NonZeroU32::new(quantity).ok_or("quantity must be non-zero")?;
            cart.add(&Product::new(id, Decimal::from(price)), quantity)?;
        }

        Ok(cart)
    }

    fn summarise(cart: &Cart) -> Vec<(String, u32, Decimal)> {
        cart.iter()
            .map(|line| {
                (
                    line.product_id().to_string(),
                    line.quantity(),
                    line.unit_price(),
                )
            })
            .collect()
    }

    #[test]
    fn colliding_lines_keep_remote_price() -> TestResult {
        let remote = cart(&[("A", 2, 10)])?;
        let local = cart(&[("A", 3, 8), ("B", 1, 5)])?;

        let merged = merge_carts(local, remote);

        assert_eq!(
            summarise(&merged),
            [
                ("A".to_string(), 5, Decimal::from(10)),
                ("B".to_string(), 1, Decimal::from(5)),
            ]
        );

        Ok(())
    }

    #[test]
    fn remote_order_comes_first() -> TestResult {
        let remote = cart(&[("R1", 1, 1), ("R2", 1, 1)])?;
        let local = cart(&[("L1", 1, 1), ("R2", 1, 1), ("L2", 1, 1)])?;

        let merged = merge_carts(local, remote);

        let ids: Vec<_> = merged.iter().map(|line| line.product_id().as_str()).collect();
        assert_eq!(ids, ["R1", "R2", "L1", "L2"]);
        assert_eq!(
            merged.get(&ProductId::from("R2")).map(|line| line.quantity()),
            Some(2)
        );

        Ok(())
    }

    #[test]
    fn empty_local_returns_remote() -> TestResult {
        let remote = cart(&[("A", 2, 10), ("B", 1, 3)])?;

        assert_eq!(merge_carts(Cart::new(), remote.clone()), remote);

        Ok(())
    }

    #[test]
    fn empty_remote_returns_local() -> TestResult {
        let local = cart(&[("B", 1, 3), ("A", 2, 10)])?;

        assert_eq!(merge_carts(local.clone(), Cart::new()), local);

        Ok(())
    }
}
