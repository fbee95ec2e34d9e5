//! The cart store.
//!
//! [`CartStore`] owns the session's cart. All mutation goes through its four
//! public operations (plus [`CartStore::rehydrate`]); each one computes its
//! result from the current cart, then for effective changes bumps the
//! version, submits a snapshot to the writer and notifies observers before
//! returning.
//!
//! Mutations are total: invalid input is a no-op reported as
//! [`CartChange::Unchanged`], and persistence failures only produce logs.

use std::sync::Arc;

use pantry_core::{CurrencyCode, ProductId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::CartConfig;
use crate::model::{Cart, CartChange, CartItem, CartVersion, NewCartItem};
use crate::persistence::{
    CartPersistence, CartSnapshot, ImmediateWriter, MemoryStorage, SnapshotWriter,
};
use crate::selectors::{self, CartSummary};
use crate::subscription::{CartEvent, Subscribers, SubscriptionId};

/// Session-scoped shopping cart.
pub struct CartStore {
    cart: Cart,
    version: CartVersion,
    persistence: CartPersistence,
    writer: Box<dyn SnapshotWriter>,
    subscribers: Subscribers,
    currency: CurrencyCode,
    max_line_quantity: Option<u32>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("version", &self.version)
            .field("persistence", &self.persistence)
            .field("subscribers", &self.subscribers)
            .field("currency", &self.currency)
            .field("max_line_quantity", &self.max_line_quantity)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Start a session, hydrating the cart from `persistence`.
    ///
    /// A missing or unreadable snapshot yields an empty cart. Stored lines
    /// above the configured per-line limit are clamped to it. Versions
    /// continue from the newest one `writer` has already accepted.
    #[must_use]
    pub fn open(
        config: &CartConfig,
        persistence: CartPersistence,
        writer: impl SnapshotWriter + 'static,
    ) -> Self {
        let cart = hydrate(&persistence, config.max_line_quantity);
        let version = writer.latest_version();
        debug!(
            key = persistence.key(),
            lines = cart.len(),
            %version,
            "Opened cart session"
        );

        Self {
            cart,
            version,
            persistence,
            writer: Box::new(writer),
            subscribers: Subscribers::new(),
            currency: config.currency,
            max_line_quantity: config.max_line_quantity,
        }
    }

    /// A store backed by process memory with synchronous writes.
    #[must_use]
    pub fn in_memory(config: &CartConfig) -> Self {
        let persistence =
            CartPersistence::new(Arc::new(MemoryStorage::new()), config.storage_key.clone());
        let writer = ImmediateWriter::new(persistence.clone());
        Self::open(config, persistence, writer)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// Creates a line with quantity 1, or increments the existing line. The
    /// existing line's name, image and price are kept as they were.
    pub fn add_item(&mut self, item: NewCartItem) -> CartChange {
        let change = self.cart.add(item, self.max_line_quantity);
        self.commit(change)
    }

    /// Set a line's quantity.
    ///
    /// Quantities `<= 0` remove the line. Quantities above the configured
    /// per-line limit are clamped to it; quantities beyond `u32::MAX` are
    /// rejected. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) -> CartChange {
        if !self.cart.contains(id) {
            return CartChange::Unchanged;
        }
        if quantity <= 0 {
            return self.remove_from_cart(id);
        }

        let Ok(mut quantity) = u32::try_from(quantity) else {
            debug!(product_id = %id, quantity, "Ignoring out-of-range quantity");
            return CartChange::Unchanged;
        };
        if let Some(limit) = self.max_line_quantity {
            quantity = quantity.min(limit);
        }

        let change = self.cart.set_quantity(id, quantity);
        self.commit(change)
    }

    /// Set a line's quantity from untyped input such as a form field.
    ///
    /// Anything that does not parse as an integer (`""`, `"NaN"`, `"1.5"`)
    /// leaves the cart untouched.
    pub fn update_quantity_str(&mut self, id: ProductId, raw: &str) -> CartChange {
        match raw.trim().parse::<i64>() {
            Ok(quantity) => self.update_quantity(id, quantity),
            Err(e) => {
                debug!(product_id = %id, raw, error = %e, "Ignoring non-integer quantity");
                CartChange::Unchanged
            }
        }
    }

    /// Remove a line. Removing an absent product is a no-op.
    pub fn remove_from_cart(&mut self, id: ProductId) -> CartChange {
        let change = self.cart.remove(id);
        self.commit(change)
    }

    /// Remove every line.
    ///
    /// Called by checkout after an order is confirmed, or on logout.
    pub fn clear(&mut self) -> CartChange {
        let change = self.cart.clear();
        self.commit(change)
    }

    /// Replace the in-memory cart with the persisted snapshot.
    pub fn rehydrate(&mut self) -> CartChange {
        self.cart = hydrate(&self.persistence, self.max_line_quantity);
        let change = CartChange::Rehydrated {
            lines: self.cart.len(),
        };
        self.commit(change)
    }

    fn commit(&mut self, change: CartChange) -> CartChange {
        if !change.is_change() {
            return change;
        }

        self.version = self.version.next();
        self.writer.submit(CartSnapshot {
            version: self.version,
            cart: self.cart.clone(),
        });

        debug!(version = %self.version, ?change, lines = self.cart.len(), "Cart updated");

        self.subscribers.notify(&CartEvent {
            change,
            version: self.version,
            cart: &self.cart,
        });
        change
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register an observer called after every effective mutation.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent<'_>) + 'static,
    {
        self.subscribers.subscribe(observer)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Current lines in insertion order.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &CartItem> + '_ {
        self.cart.items()
    }

    /// Line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.cart.get(id)
    }

    /// Version of the current state.
    #[must_use]
    pub const fn version(&self) -> CartVersion {
        self.version
    }

    /// Currency totals are reported in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        selectors::total_items(&self.cart)
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        selectors::total_price(&self.cart)
    }

    /// Display-ready summary for badges, drawers and checkout.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        selectors::summary(&self.cart, self.currency)
    }
}

fn hydrate(persistence: &CartPersistence, max_line_quantity: Option<u32>) -> Cart {
    let mut cart = persistence.load();
    if let Some(limit) = max_line_quantity {
        let clamped = cart.clamp_quantities(limit);
        if clamped > 0 {
            debug!(key = persistence.key(), clamped, limit, "Clamped stored line quantities");
        }
    }
    cart
}
