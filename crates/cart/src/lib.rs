//! Pantry Cart - Shopping cart state for the storefront.
//!
//! One [`CartStore`] exists per shopper session. It is constructed at session
//! start (hydrated from storage), passed by reference to whatever needs it,
//! and cleared after checkout or logout.
//!
//! # Architecture
//!
//! - [`model`] - `Cart`, `CartItem` and operation outcomes
//! - [`store`] - The only place a cart is mutated
//! - [`selectors`] - Totals and display summaries derived from the lines
//! - [`persistence`] - Storage backends and versioned snapshot writers
//! - [`subscription`] - Synchronous observers notified after each change
//! - [`config`] - Environment-driven session configuration
//!
//! # Example
//!
//! ```rust
//! use pantry_cart::{CartConfig, CartStore, NewCartItem};
//! use pantry_core::ProductId;
//! use rust_decimal::Decimal;
//!
//! let mut store = CartStore::in_memory(&CartConfig::default());
//! let water = NewCartItem::new(ProductId::new(1), "Water", Decimal::from(10), "water.png");
//!
//! store.add_item(water.clone());
//! store.add_item(water);
//!
//! assert_eq!(store.total_items(), 2);
//! assert_eq!(store.total_price(), Decimal::from(20));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod model;
pub mod persistence;
pub mod selectors;
pub mod store;
pub mod subscription;

pub use config::{CartConfig, ConfigError};
pub use error::{PersistenceError, StorageError};
pub use model::{Cart, CartChange, CartItem, CartVersion, NewCartItem};
pub use persistence::{
    CartPersistence, CartSnapshot, CartStorage, DebouncedWriter, FileStorage, ImmediateWriter,
    MemoryStorage, SnapshotWriter,
};
pub use selectors::{CartSummary, LineSummary};
pub use store::CartStore;
pub use subscription::{CartEvent, SubscriptionId};
