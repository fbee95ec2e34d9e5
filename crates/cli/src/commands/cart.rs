//! Cart session commands.
//!
//! Each command opens the persisted cart, applies one operation, and waits
//! for the debounced writer to flush before returning.
//!
//! # Environment Variables
//!
//! - `PANTRY_CART_DIR` - Directory holding persisted carts
//! - `PANTRY_CART_KEY` - Storage key of the session cart
//! - `PANTRY_CART_DEBOUNCE_MS` - Write debounce window
//! - `PANTRY_CURRENCY` - Currency totals are reported in
//! - `PANTRY_MAX_LINE_QUANTITY` - Upper bound on a single line's quantity

use std::sync::Arc;

use pantry_cart::{
    CartChange, CartConfig, CartPersistence, CartStore, ConfigError, DebouncedWriter,
    FileStorage, ImmediateWriter, NewCartItem, PersistenceError,
};
use pantry_core::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pending writes could not be flushed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Price is not a usable unit price.
    #[error("Invalid price: {0}. Prices must not be negative")]
    InvalidPrice(Decimal),
}

/// An open cart with its background writer.
struct Session {
    store: CartStore,
    writer: DebouncedWriter,
}

impl Session {
    fn open() -> Result<Self, CartCommandError> {
        let config = CartConfig::from_env()?;
        let persistence = persistence_for(&config);
        let writer = DebouncedWriter::spawn(persistence.clone(), config.debounce);

        let mut store = CartStore::open(&config, persistence, writer.clone());
        store.subscribe(|event| {
            info!(
                version = %event.version,
                items = event.total_items(),
                "Cart badge updated"
            );
        });

        Ok(Self { store, writer })
    }

    async fn close(self, change: CartChange) -> Result<(), CartCommandError> {
        self.writer.shutdown().await?;
        if change.is_change() {
            info!(?change, "Cart saved");
        } else {
            info!("Cart unchanged");
        }
        log_summary(&self.store);
        Ok(())
    }
}

fn persistence_for(config: &CartConfig) -> CartPersistence {
    let storage = Arc::new(FileStorage::new(&config.storage_dir));
    CartPersistence::new(storage, config.storage_key.clone())
}

fn validate_price(price: Decimal) -> Result<Decimal, CartCommandError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CartCommandError::InvalidPrice(price));
    }
    Ok(price)
}

fn log_summary(store: &CartStore) {
    let summary = store.summary();
    for line in &summary.lines {
        info!(
            "  [{}] {} x{} @ {} = {}",
            line.id,
            line.name,
            line.quantity,
            line.unit_price,
            line.line_price
        );
    }
    info!(
        "Items: {}  Subtotal: {}",
        summary.item_count, summary.subtotal
    );
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the price is negative, or
/// the writer stops before flushing.
pub async fn add(
    id: ProductId,
    name: String,
    price: Decimal,
    image: String,
) -> Result<(), CartCommandError> {
    let price = validate_price(price)?;
    let mut session = Session::open()?;
    let change = session
        .store
        .add_item(NewCartItem::new(id, name, price, image));
    session.close(change).await
}

/// Set a line's quantity from raw input.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the writer stops before
/// flushing.
pub async fn update(id: ProductId, quantity: &str) -> Result<(), CartCommandError> {
    let mut session = Session::open()?;
    let change = session.store.update_quantity_str(id, quantity);
    session.close(change).await
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the writer stops before
/// flushing.
pub async fn remove(id: ProductId) -> Result<(), CartCommandError> {
    let mut session = Session::open()?;
    let change = session.store.remove_from_cart(id);
    session.close(change).await
}

/// Remove every line.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the writer stops before
/// flushing.
pub async fn clear() -> Result<(), CartCommandError> {
    let mut session = Session::open()?;
    let change = session.store.clear();
    session.close(change).await
}

/// Print the cart's lines and totals.
///
/// # Errors
///
/// Returns an error if configuration is invalid.
pub fn show() -> Result<(), CartCommandError> {
    let config = CartConfig::from_env()?;
    let persistence = persistence_for(&config);
    let store = CartStore::open(&config, persistence.clone(), ImmediateWriter::new(persistence));

    if store.cart().is_empty() {
        info!("Cart is empty");
        return Ok(());
    }
    log_summary(&store);
    Ok(())
}
