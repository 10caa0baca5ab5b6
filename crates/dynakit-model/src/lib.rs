//! Wire-protocol model types for dynakit.
//!
//! These are the types exchanged with a partition-key/sort-key store that
//! speaks a DynamoDB-style JSON protocol: tagged attribute values, the query
//! request/response shapes, and the opaque store error. The query-building
//! logic lives in `dynakit-core`; store adapters only need this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attr_value;
pub mod error;
pub mod request;
pub mod types;

pub use attr_value::AttrValue;
pub use error::StoreError;
pub use request::{QueryRequest, QueryResponse};
pub use types::{Direction, Literal};
