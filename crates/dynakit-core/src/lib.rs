//! Client-side composite-key addressing, expression synthesis, and cursor
//! pagination for partition-key/sort-key stores.
//!
//! Callers address items with structured multi-field logical keys; this crate
//! folds them into the store's flat string keys (and back), synthesizes
//! key-condition/filter/projection expressions with collision-free
//! placeholders, and emulates bidirectional has-more pagination over the
//! store's single-window query primitive.
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod error;
pub mod expression;
pub mod memory;
pub mod paginate;
pub mod range;
pub mod schema;
pub mod store;

pub use codec::KeyFields;
pub use config::PaginatorConfig;
pub use error::{KeyError, QueryError, SchemaError};
pub use expression::{CmpOp, ExpressionBuilder, FieldCondition, Predicates};
pub use memory::MemoryStore;
pub use paginate::{CursorPaginator, LogicalItem, Page, PageRequest};
pub use range::KeyConditionBuilder;
pub use schema::{KeySchema, KeySide};
pub use store::Store;
