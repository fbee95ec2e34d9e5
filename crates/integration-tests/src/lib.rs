//! Integration tests for Pantry.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pantry-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Worked examples of the cart operations
//! - `cart_properties` - Property tests over random operation sequences
//! - `cart_file_persistence` - File-backed sessions and debounced writes
//!
//! This library holds the fixtures and `proptest` strategies the tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use pantry_cart::{
    Cart, CartConfig, CartPersistence, CartStore, ImmediateWriter, MemoryStorage, NewCartItem,
};
use pantry_core::ProductId;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// A product payload with a whole-unit price.
#[must_use]
pub fn product(id: i32, price: i64) -> NewCartItem {
    product_priced(id, Decimal::from(price))
}

/// A product payload with an arbitrary unit price.
#[must_use]
pub fn product_priced(id: i32, price: Decimal) -> NewCartItem {
    NewCartItem::new(
        ProductId::new(id),
        format!("Product {id}"),
        price,
        format!("https://cdn.example.com/{id}.png"),
    )
}

/// A store over fresh in-memory storage, plus a handle to its persistence.
#[must_use]
pub fn memory_store() -> (CartStore, CartPersistence) {
    let persistence = CartPersistence::new(Arc::new(MemoryStorage::new()), "cart");
    let store = CartStore::open(
        &CartConfig::default(),
        persistence.clone(),
        ImmediateWriter::new(persistence.clone()),
    );
    (store, persistence)
}

/// Sum of quantities, computed independently of the selectors.
#[must_use]
pub fn expected_items(cart: &Cart) -> u64 {
    let mut total = 0;
    for line in cart.items() {
        total += u64::from(line.quantity);
    }
    total
}

/// Sum of `price * quantity`, computed independently of the selectors.
///
/// `None` when the exact sum does not fit in a `Decimal`.
#[must_use]
pub fn expected_price(cart: &Cart) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for line in cart.items() {
        let line_total = line.price.checked_mul(Decimal::from(line.quantity))?;
        total = total.checked_add(line_total)?;
    }
    Some(total)
}

/// One public cart operation.
#[derive(Debug, Clone)]
pub enum CartOp {
    Add { id: i32, price: Decimal },
    Update { id: i32, quantity: i64 },
    Remove { id: i32 },
    Clear,
}

impl CartOp {
    /// Apply this operation to `store`.
    pub fn apply(&self, store: &mut CartStore) {
        match *self {
            Self::Add { id, price } => {
                store.add_item(product_priced(id, price));
            }
            Self::Update { id, quantity } => {
                store.update_quantity(ProductId::new(id), quantity);
            }
            Self::Remove { id } => {
                store.remove_from_cart(ProductId::new(id));
            }
            Self::Clear => {
                store.clear();
            }
        }
    }
}

/// Unit prices: mostly small, sometimes large enough to overflow a line
/// total.
pub fn unit_price() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        8 => (0..50i64).prop_map(Decimal::from),
        1 => Just(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0)),
        1 => Just(Decimal::MAX),
    ]
}

/// Requested quantities: mostly small, sometimes around `u32::MAX`.
pub fn requested_quantity() -> impl Strategy<Value = i64> {
    let max = i64::from(u32::MAX);
    prop_oneof![
        8 => -3..10i64,
        2 => (max - 2)..=(max + 1),
    ]
}

/// Random operations over a small id space so lines collide often.
pub fn cart_op() -> impl Strategy<Value = CartOp> {
    prop_oneof![
        4 => (0..6i32, unit_price()).prop_map(|(id, price)| CartOp::Add { id, price }),
        2 => (0..6i32, requested_quantity())
            .prop_map(|(id, quantity)| CartOp::Update { id, quantity }),
        1 => (0..6i32).prop_map(|id| CartOp::Remove { id }),
        1 => Just(CartOp::Clear),
    ]
}

/// Sequences of cart operations.
pub fn cart_ops() -> impl Strategy<Value = Vec<CartOp>> {
    prop::collection::vec(cart_op(), 0..40)
}
