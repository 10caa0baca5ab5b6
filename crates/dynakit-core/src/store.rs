//! The seam to the physical store.
//!
//! One operation: issue a query and get back a window of records plus an
//! optional continuation key. Adapters for real backends implement this
//! trait; [`crate::memory::MemoryStore`] implements it for tests and local
//! development. The call is the only suspension point in the crate.

use async_trait::async_trait;

use dynakit_model::{QueryRequest, QueryResponse, StoreError};

/// A partition-key/sort-key store that answers range queries.
#[async_trait]
pub trait Store: Send + Sync {
    /// Executes one query request and returns the raw response window.
    ///
    /// # Errors
    ///
    /// Store-side failures are returned as the opaque [`StoreError`] and are
    /// never interpreted or retried by this layer.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError>;
}
