//! Integration tests for saving, loading and clearing a cart.
//!
//! Run with: cargo test -p quickbasket-integration-tests --test cart_round_trip

use quickbasket_cart_storage::{
    CART_KEY, CartStore, ENVELOPE_TYPE, MemoryBackend, SCHEMA_VERSION, StorageBackend,
};
use quickbasket_core::{CartItem, Quantity, UnitPrice, cart_subtotal};
use serde_json::{Value, json};

fn item(name: &str, price: &str, quantity: u64) -> CartItem {
    CartItem::new(
        name,
        UnitPrice::parse(price).expect("valid price"),
        Quantity::new(quantity).expect("valid quantity"),
    )
    .expect("valid item")
}

fn stored_envelope(store: &CartStore<MemoryBackend>) -> Value {
    let raw = store
        .backend()
        .peek(CART_KEY)
        .expect("cart should be stored");
    serde_json::from_str(&raw).expect("stored cart should be JSON")
}

#[test]
fn test_round_trip_preserves_valid_items() {
    let store = CartStore::new(MemoryBackend::new());
    let items = vec![
        item("Mango", "20", 1).with_id("sku-1").with_image("mango.png"),
        item("Kiwi", "3.50", 4).with_id(42),
    ];

    assert!(store.save_cart(&items));
    assert_eq!(store.load_cart(), items);
}

#[test]
fn test_invalid_items_are_normalized_or_dropped() {
    let store = CartStore::new(MemoryBackend::new());
    let raw = vec![
        json!({"name": "Apple", "price": 9.995, "quantity": 2.7}),
        json!({"name": "", "price": 1, "quantity": 1}),
        json!({"name": "Bad", "price": -1, "quantity": 1}),
        json!({"price": 5, "quantity": 1}),
        json!("not an item"),
    ];

    assert!(store.save_cart(&raw));

    let items = store.load_cart();
    assert_eq!(items.len(), 1);
    let apple = items.first().expect("apple should survive");
    assert_eq!(apple.name(), "Apple");
    assert_eq!(apple.price().to_string(), "10.00");
    assert_eq!(apple.quantity().get(), 2);
    assert_eq!(apple.image(), "");
    assert_eq!(apple.id(), &Value::Null);
}

#[test]
fn test_loose_numeric_strings_are_coerced() {
    let store = CartStore::new(MemoryBackend::new());
    let raw = vec![json!({"name": " Pear ", "price": " 1.5 ", "quantity": "3"})];

    assert!(store.save_cart(&raw));

    let items = store.load_cart();
    assert_eq!(items, vec![item("Pear", "1.50", 3)]);
}

#[test]
fn test_saving_loaded_cart_is_idempotent() {
    let store = CartStore::new(MemoryBackend::new());
    let raw = vec![
        json!({"id": "a", "name": "Apple", "price": 0.333, "quantity": 7.9, "image": "a.png"}),
        json!({"name": "Melon", "price": "12", "quantity": true}),
    ];

    assert!(store.save_cart(&raw));
    let first = store.load_cart();
    assert!(store.save_cart(&first));
    let second = store.load_cart();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_envelope_layout() {
    let store = CartStore::new(MemoryBackend::new());
    assert!(store.save_cart(&[item("Mango", "20", 2)]));

    let envelope = stored_envelope(&store);
    assert_eq!(envelope["type"], ENVELOPE_TYPE);
    assert_eq!(envelope["version"], SCHEMA_VERSION);
    assert!(envelope["updatedAt"].as_i64().expect("timestamp") > 0);
    assert_eq!(envelope["items"][0]["name"], "Mango");
    assert_eq!(envelope["items"][0]["quantity"], 2);
}

#[test]
fn test_clear_then_load_is_empty() {
    let store = CartStore::new(MemoryBackend::new());
    assert!(store.save_cart(&[item("Mango", "20", 1)]));

    assert!(store.clear_cart());
    assert!(store.load_cart().is_empty());
    assert!(!store.backend().contains_key(CART_KEY));

    // Clearing an already empty cart still succeeds
    assert!(store.clear_cart());
}

#[test]
fn test_corrupt_primary_loads_empty() {
    let store = CartStore::new(MemoryBackend::new());
    for garbage in ["{not json", "[]", "42", r#"{"items": "nope"}"#] {
        store
            .backend()
            .set(CART_KEY, garbage)
            .expect("memory write");
        assert!(store.load_cart().is_empty(), "payload {garbage:?}");
    }
}

#[test]
fn test_storage_info_reflects_stored_cart() {
    let store = CartStore::new(MemoryBackend::new());

    let empty = store.storage_info();
    assert!(empty.available);
    assert_eq!(empty.key, CART_KEY);
    assert_eq!(empty.version, None);
    assert_eq!(empty.items, 0);
    assert_eq!(empty.bytes, 0);

    let items = vec![item("Mango", "20", 1), item("Kiwi", "3", 2)];
    assert!(store.save_cart(&items));

    let info = store.storage_info();
    let raw = store.backend().peek(CART_KEY).expect("stored cart");
    assert_eq!(info.version.as_deref(), Some(SCHEMA_VERSION));
    assert_eq!(info.items, 2);
    assert_eq!(info.bytes, raw.len());
    assert_eq!(cart_subtotal(&store.load_cart()).to_string(), "26.00");
}

#[test]
fn test_unavailable_storage_fails_softly() {
    let store = CartStore::new(MemoryBackend::new());
    assert!(store.save_cart(&[item("Mango", "20", 1)]));
    store.backend().set_available(false);

    assert!(!store.is_available());
    assert!(!store.save_cart(&[item("Kiwi", "3", 1)]));
    assert!(store.load_cart().is_empty());
    assert!(!store.clear_cart());
    assert!(!store.migrate_from_legacy());
    assert!(!store.storage_info().available);

    store.backend().set_available(true);
    assert_eq!(store.load_cart(), vec![item("Mango", "20", 1)]);
}

#[test]
fn test_bulk_quantity_survives_and_oversized_price_is_dropped() {
    let store = CartStore::new(MemoryBackend::new());
    let raw = vec![
        json!({"name": "Bulk", "price": 1, "quantity": 5_000_000_000u64}),
        json!({"name": "Yacht", "price": 1e30, "quantity": 1}),
    ];

    assert!(store.save_cart(&raw));

    let items = store.load_cart();
    assert_eq!(items, vec![item("Bulk", "1", 5_000_000_000)]);
    assert_eq!(cart_subtotal(&items).to_string(), "5000000000.00");
}
