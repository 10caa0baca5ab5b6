//! Integration tests for dynakit.
//!
//! Every scenario drives the public API (key-condition building, expression
//! synthesis, cursor pagination) end to end against the in-memory store,
//! which speaks the same wire shapes a real backend would.

use std::collections::HashMap;
use std::sync::Once;

use dynakit_core::{KeySchema, KeySide, MemoryStore};
use dynakit_model::AttrValue;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// The schema most scenarios use: single-field partition, composite sort key.
#[must_use]
pub fn orders_schema() -> KeySchema {
    KeySchema::new(
        KeySide::single("pk", "tenant"),
        Some(KeySide::composite("sk", ["kind", "seq"], "#")),
    )
    .unwrap_or_else(|e| panic!("schema should validate: {e}"))
}

/// A store seeded with `count` order records for the `acme` tenant, with
/// two-digit sequence numbers so lexical and numeric order agree.
#[must_use]
pub fn seeded_store(count: usize) -> MemoryStore {
    init_tracing();
    let store = MemoryStore::new("pk", Some("sk"));
    for i in 0..count {
        store
            .put(order_record("acme", i))
            .unwrap_or_else(|e| panic!("seed record {i} should store: {e}"));
    }
    store
}

/// One order record with payload attributes alongside the key attributes.
#[must_use]
pub fn order_record(tenant: &str, seq: usize) -> HashMap<String, AttrValue> {
    let mut record = HashMap::new();
    record.insert("pk".to_owned(), AttrValue::S(tenant.to_owned()));
    record.insert("sk".to_owned(), AttrValue::S(format!("order#{seq:02}")));
    record.insert("amount".to_owned(), AttrValue::N((seq * 10).to_string()));
    record.insert(
        "status".to_owned(),
        AttrValue::S(if seq % 2 == 0 { "open" } else { "closed" }.to_owned()),
    );
    record
}

mod test_pagination;
mod test_query;
