//! Change notification for cart consumers.
//!
//! Observers are plain closures registered with the store. They are called
//! synchronously, in registration order, after the cart has been updated and
//! the snapshot handed to persistence. Observers get a shared borrow of the
//! cart and cannot mutate it from inside the callback.

use rust_decimal::Decimal;

use crate::model::{Cart, CartChange, CartVersion};
use crate::selectors;

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// What observers receive after each effective mutation.
#[derive(Debug, Clone, Copy)]
pub struct CartEvent<'a> {
    pub change: CartChange,
    pub version: CartVersion,
    pub cart: &'a Cart,
}

impl CartEvent<'_> {
    /// Total quantity across all lines at this version.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        selectors::total_items(self.cart)
    }

    /// Total price across all lines at this version.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        selectors::total_price(self.cart)
    }
}

type Observer = Box<dyn FnMut(&CartEvent<'_>)>;

/// Registry of observers.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer)>,
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.observers.len())
            .finish()
    }
}

impl Subscribers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent<'_>) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Call every observer with `event`.
    pub fn notify(&mut self, event: &CartEvent<'_>) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
