//! Cart data model.
//!
//! A [`Cart`] is an insertion-ordered mapping from [`ProductId`] to
//! [`CartItem`]. Every entry has `quantity >= 1` and there is exactly one
//! entry per product. Only the store mutates a cart; everything outside this
//! crate gets read-only access.

use indexmap::IndexMap;
use pantry_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Product data supplied by a listing when the shopper adds it to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price at the moment the product is added.
    pub price: Decimal,
    pub image: String,
}

impl NewCartItem {
    /// Create a new cart item payload.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: image.into(),
        }
    }
}

/// One line entry in the cart.
///
/// Serialized as the persisted record `{id, name, price, image, quantity}`.
/// `name`, `image` and `price` are fixed when the line is created; later adds
/// of the same product only change `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    fn from_new(item: NewCartItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            image: item.image,
            quantity: 1,
        }
    }

    /// `price * quantity` for this line, or `None` if it does not fit in a
    /// `Decimal`.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        line_total(self.price, self.quantity)
    }

    /// `price * quantity` for this line, saturating at `Decimal::MAX`/`MIN`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

fn line_total(price: Decimal, quantity: u32) -> Option<Decimal> {
    price.checked_mul(Decimal::from(quantity))
}

/// Logical mutation counter.
///
/// Incremented once per effective mutation. Persistence uses it to make sure
/// an older snapshot never overwrites a newer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CartVersion(u64);

impl CartVersion {
    /// Create a version from a raw counter value.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Get the raw counter value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for CartVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Outcome of a cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was created with quantity 1.
    Added { id: ProductId },
    /// An existing line's quantity was bumped by an add.
    Incremented { id: ProductId, quantity: u32 },
    /// An existing line's quantity was set explicitly.
    QuantitySet { id: ProductId, quantity: u32 },
    /// A line was removed.
    Removed { id: ProductId },
    /// Every line was removed.
    Cleared { removed: usize },
    /// The cart was replaced by a freshly loaded snapshot.
    Rehydrated { lines: usize },
    /// Nothing changed (unknown id, invalid input, or already at the limit).
    Unchanged,
}

impl CartChange {
    /// Whether the operation modified the cart.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The cart aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    lines: IndexMap<ProductId, CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from stored records.
    ///
    /// Records sharing an id are merged by summing their quantities (the
    /// first record's metadata wins). Records with a zero quantity, and
    /// records whose line total does not fit in a `Decimal`, are dropped.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut lines: IndexMap<ProductId, CartItem> = IndexMap::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match lines.get_mut(&item.id) {
                Some(existing) => {
                    let merged = existing.quantity.saturating_add(item.quantity);
                    if line_total(existing.price, merged).is_some() {
                        existing.quantity = merged;
                    } else {
                        warn!(product_id = %item.id, "Dropping duplicate record that overflows line total");
                    }
                }
                None if item.checked_line_total().is_none() => {
                    warn!(product_id = %item.id, "Dropping record whose line total overflows");
                }
                None => {
                    lines.insert(item.id, item);
                }
            }
        }
        Self { lines }
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.lines.get(&id)
    }

    /// Whether the cart has a line for this product.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.lines.contains_key(&id)
    }

    /// Lines in the order they were first added.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &CartItem> + '_ {
        self.lines.values()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of a product, creating the line if needed.
    pub(crate) fn add(&mut self, item: NewCartItem, max_quantity: Option<u32>) -> CartChange {
        let id = item.id;
        if let Some(existing) = self.lines.get_mut(&id) {
            let limit = max_quantity.unwrap_or(u32::MAX);
            if existing.quantity >= limit {
                return CartChange::Unchanged;
            }
            let quantity = existing.quantity + 1;
            if line_total(existing.price, quantity).is_none() {
                return CartChange::Unchanged;
            }
            existing.quantity = quantity;
            return CartChange::Incremented {
                id,
                quantity: existing.quantity,
            };
        }
        self.lines.insert(id, CartItem::from_new(item));
        CartChange::Added { id }
    }

    /// Set a line's quantity. The caller guarantees `quantity >= 1`.
    ///
    /// Quantities whose line total would overflow are rejected.
    pub(crate) fn set_quantity(&mut self, id: ProductId, quantity: u32) -> CartChange {
        match self.lines.get_mut(&id) {
            Some(existing) if existing.quantity == quantity => CartChange::Unchanged,
            Some(existing) if line_total(existing.price, quantity).is_none() => {
                CartChange::Unchanged
            }
            Some(existing) => {
                existing.quantity = quantity;
                CartChange::QuantitySet { id, quantity }
            }
            None => CartChange::Unchanged,
        }
    }

    /// Lower every line above `limit` to `limit`. Returns how many changed.
    pub(crate) fn clamp_quantities(&mut self, limit: u32) -> usize {
        let mut clamped = 0;
        for line in self.lines.values_mut() {
            if line.quantity > limit {
                line.quantity = limit;
                clamped += 1;
            }
        }
        clamped
    }

    pub(crate) fn remove(&mut self, id: ProductId) -> CartChange {
        self.lines
            .shift_remove(&id)
            .map_or(CartChange::Unchanged, |_| CartChange::Removed { id })
    }

    pub(crate) fn clear(&mut self) -> CartChange {
        let removed = self.lines.len();
        if removed == 0 {
            return CartChange::Unchanged;
        }
        self.lines.clear();
        CartChange::Cleared { removed }
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.lines.into_values().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, price: i64) -> NewCartItem {
        NewCartItem::new(ProductId::new(id), format!("Item {id}"), Decimal::from(price), "x.png")
    }

    fn record(id: i32, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Item {id}"),
            price: Decimal::from(5),
            image: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_add_new_line() {
        let mut cart = Cart::new();
        let change = cart.add(item(1, 10), None);
        assert_eq!(change, CartChange::Added { id: ProductId::new(1) });
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_existing_increments_and_keeps_metadata() {
        let mut cart = Cart::new();
        cart.add(item(1, 10), None);
        let change = cart.add(
            NewCartItem::new(ProductId::new(1), "Renamed", Decimal::from(99), "y.png"),
            None,
        );

        assert_eq!(
            change,
            CartChange::Incremented {
                id: ProductId::new(1),
                quantity: 2
            }
        );
        assert_eq!(cart.len(), 1);
        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.name, "Item 1");
        assert_eq!(line.price, Decimal::from(10));
        assert_eq!(line.image, "x.png");
    }

    #[test]
    fn test_add_respects_limit() {
        let mut cart = Cart::new();
        cart.add(item(1, 10), Some(2));
        cart.add(item(1, 10), Some(2));
        assert_eq!(cart.add(item(1, 10), Some(2)), CartChange::Unchanged);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_set_quantity_same_value_is_unchanged() {
        let mut cart = Cart::new();
        cart.add(item(1, 10), None);
        assert_eq!(cart.set_quantity(ProductId::new(1), 1), CartChange::Unchanged);
        assert_eq!(cart.set_quantity(ProductId::new(2), 4), CartChange::Unchanged);
    }

    #[test]
    fn test_remove_preserves_order_of_remaining_lines() {
        let mut cart = Cart::new();
        cart.add(item(1, 1), None);
        cart.add(item(2, 1), None);
        cart.add(item(3, 1), None);
        cart.remove(ProductId::new(2));

        let ids: Vec<i32> = cart.items().map(|line| line.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_clear_empty_is_unchanged() {
        let mut cart = Cart::new();
        assert_eq!(cart.clear(), CartChange::Unchanged);
    }

    #[test]
    fn test_from_items_merges_duplicates_and_drops_zero() {
        let cart = Cart::from_items(vec![record(1, 2), record(2, 0), record(1, 3)]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
        assert!(!cart.contains(ProductId::new(2)));
    }

    #[test]
    fn test_serializes_as_record_array() {
        let cart = Cart::from_items(vec![record(1, 3)]);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "name": "Item 1", "price": "5", "image": "", "quantity": 3}
            ])
        );
    }

    #[test]
    fn test_line_total() {
        let line = CartItem {
            quantity: 3,
            ..record(1, 1)
        };
        assert_eq!(line.line_total(), Decimal::from(15));
    }

    #[test]
    fn test_set_quantity_rejects_overflowing_line_total() {
        let mut cart = Cart::new();
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        cart.add(NewCartItem::new(ProductId::new(1), "Vintage", huge, ""), None);

        assert_eq!(
            cart.set_quantity(ProductId::new(1), 4_000_000_000),
            CartChange::Unchanged
        );
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_rejects_overflowing_increment() {
        let mut cart = Cart::new();
        cart.add(NewCartItem::new(ProductId::new(1), "Max", Decimal::MAX, ""), None);
        assert_eq!(
            cart.add(NewCartItem::new(ProductId::new(1), "Max", Decimal::MAX, ""), None),
            CartChange::Unchanged
        );
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_from_items_drops_overflowing_records() {
        let cart = Cart::from_items(vec![
            CartItem {
                price: Decimal::MAX,
                quantity: u32::MAX,
                ..record(1, 1)
            },
            CartItem {
                price: Decimal::MAX,
                ..record(2, 1)
            },
            CartItem {
                price: Decimal::MAX,
                ..record(2, 1)
            },
            record(3, 2),
        ]);

        assert!(!cart.contains(ProductId::new(1)));
        assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 1);
        assert_eq!(cart.get(ProductId::new(3)).unwrap().quantity, 2);
    }

    #[test]
    fn test_line_total_saturates() {
        let line = CartItem {
            price: Decimal::MIN,
            quantity: 2,
            ..record(1, 1)
        };
        assert_eq!(line.checked_line_total(), None);
        assert_eq!(line.line_total(), Decimal::MIN);
    }

    #[test]
    fn test_clamp_quantities() {
        let mut cart = Cart::from_items(vec![record(1, 40), record(2, 3)]);
        assert_eq!(cart.clamp_quantities(12), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 12);
        assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 3);
    }
}
