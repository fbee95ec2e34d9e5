//! File-backed cart sessions with the debounced writer.

use std::sync::Arc;
use std::time::Duration;

use pantry_cart::{
    CartChange, CartConfig, CartPersistence, CartStore, CartVersion, DebouncedWriter, FileStorage,
};
use pantry_core::ProductId;
use pantry_integration_tests::product;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn file_persistence(dir: &std::path::Path) -> CartPersistence {
    CartPersistence::new(Arc::new(FileStorage::new(dir)), "pantry.cart")
}

fn config() -> CartConfig {
    CartConfig {
        debounce: Duration::from_millis(25),
        ..CartConfig::default()
    }
}

#[tokio::test]
async fn test_cart_survives_reload() {
    let dir = tempdir().unwrap();
    let persistence = file_persistence(dir.path());

    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let mut store = CartStore::open(&config(), persistence.clone(), writer.clone());
    store.add_item(product(1, 10));
    store.add_item(product(2, 3));
    store.update_quantity(ProductId::new(2), 4);
    writer.shutdown().await.unwrap();

    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let reloaded = CartStore::open(&config(), persistence, writer.clone());
    assert_eq!(reloaded.cart(), store.cart());
    assert_eq!(reloaded.total_price(), Decimal::from(22));
    writer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stored_layout_is_record_array() {
    let dir = tempdir().unwrap();
    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let mut store = CartStore::open(&config(), persistence, writer.clone());

    store.add_item(product(5, 12));
    writer.flush().await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join("pantry.cart.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{
            "id": 5,
            "name": "Product 5",
            "price": "12",
            "image": "https://cdn.example.com/5.png",
            "quantity": 1
        }])
    );

    writer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rapid_mutations_persist_latest_state() {
    let dir = tempdir().unwrap();
    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let mut store = CartStore::open(&config(), persistence.clone(), writer.clone());

    for _ in 0..20 {
        store.add_item(product(1, 2));
    }
    store.update_quantity(ProductId::new(1), 7);
    store.add_item(product(3, 9));
    store.remove_from_cart(ProductId::new(3));

    writer.flush().await.unwrap();
    assert_eq!(writer.persisted_version(), store.version());
    assert_eq!(&persistence.load(), store.cart());
    assert_eq!(persistence.load().get(ProductId::new(1)).map(|l| l.quantity), Some(7));

    writer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mutation_does_not_wait_for_write() {
    let dir = tempdir().unwrap();
    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), Duration::from_secs(60));
    let mut store = CartStore::open(&config(), persistence.clone(), writer.clone());

    store.add_item(product(1, 2));

    // In-memory state is updated; the write is still pending.
    assert_eq!(store.total_items(), 1);
    assert_eq!(writer.persisted_version(), CartVersion::default());
    assert!(persistence.load().is_empty());
}

#[tokio::test]
async fn test_corrupt_file_opens_empty_and_is_overwritten() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("pantry.cart.json"), "{\"truncated\": [").unwrap();

    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let mut store = CartStore::open(&config(), persistence.clone(), writer.clone());
    assert!(store.cart().is_empty());

    store.add_item(product(4, 6));
    writer.shutdown().await.unwrap();
    assert_eq!(persistence.load().len(), 1);
}

#[tokio::test]
async fn test_unwritable_storage_keeps_memory_authoritative() {
    let dir = tempdir().unwrap();
    // A directory where the cart file should be makes every rename fail.
    std::fs::create_dir_all(dir.path().join("pantry.cart.json")).unwrap();

    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);
    let mut store = CartStore::open(&config(), persistence.clone(), writer.clone());

    store.add_item(product(1, 10));
    store.add_item(product(1, 10));
    writer.flush().await.unwrap();

    assert_eq!(store.total_items(), 2);
    assert!(persistence.try_save(store.cart()).is_err());

    writer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shared_writer_accepts_later_session() {
    let dir = tempdir().unwrap();
    let persistence = file_persistence(dir.path());
    let writer = DebouncedWriter::spawn(persistence.clone(), config().debounce);

    let mut first = CartStore::open(&config(), persistence.clone(), writer.clone());
    first.add_item(product(1, 10));
    first.add_item(product(2, 5));
    writer.flush().await.unwrap();
    assert_eq!(persistence.load().len(), 2);

    // Same writer, fresh store: its versions continue past the first session.
    let mut second = CartStore::open(&config(), persistence.clone(), writer.clone());
    assert_eq!(second.version(), first.version());
    assert_eq!(second.clear(), CartChange::Cleared { removed: 2 });
    writer.flush().await.unwrap();

    assert!(persistence.load().is_empty());
    assert_eq!(&persistence.load(), second.cart());
    assert_eq!(writer.persisted_version(), second.version());

    writer.shutdown().await.unwrap();
}
