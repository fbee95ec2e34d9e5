//! Cart persistence.
//!
//! The cart is stored as a JSON array of `{id, name, price, image, quantity}`
//! records under a single storage key. Loading never fails from the caller's
//! point of view: a missing snapshot is an empty cart, and an unreadable or
//! corrupt one is logged and treated as empty.
//!
//! # Modules
//!
//! - [`storage`] - Key/value backends (memory, filesystem)
//! - [`writer`] - Immediate and debounced snapshot writers

pub mod storage;
pub mod writer;

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::error::PersistenceError;
use crate::model::Cart;

pub use storage::{CartStorage, FileStorage, MemoryStorage};
pub use writer::{CartSnapshot, DebouncedWriter, ImmediateWriter, SnapshotWriter};

/// Loads and saves the cart under one storage key.
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn CartStorage>,
    key: String,
}

impl std::fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CartPersistence {
    /// Create a persistence adapter over `storage` using `key`.
    #[must_use]
    pub fn new(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Storage key the cart is saved under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored cart, surfacing failures.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage cannot be read or the stored
    /// snapshot cannot be parsed.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn try_load(&self) -> Result<Option<Cart>, PersistenceError> {
        let Some(raw) = self.storage.read(&self.key)? else {
            return Ok(None);
        };
        let cart: Cart = serde_json::from_str(&raw)?;
        debug!(lines = cart.len(), "Loaded cart snapshot");
        Ok(Some(cart))
    }

    /// Load the stored cart, degrading to an empty cart on any failure.
    #[must_use]
    pub fn load(&self) -> Cart {
        match self.try_load() {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable cart snapshot");
                Cart::new()
            }
        }
    }

    /// Save the cart, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the cart cannot be encoded or written.
    #[instrument(skip(self, cart), fields(key = %self.key, lines = cart.len()))]
    pub fn try_save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(cart)?;
        self.storage.write(&self.key, &raw)?;
        Ok(())
    }

    /// Save the cart. Failures are logged and otherwise ignored.
    pub fn save(&self, cart: &Cart) {
        if let Err(e) = self.try_save(cart) {
            error!(key = %self.key, error = %e, "Failed to save cart");
        }
    }

    /// Remove the stored snapshot.
    pub fn discard(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            error!(key = %self.key, error = %e, "Failed to remove stored cart");
        }
    }
}
