//! The opaque store-side error.
//!
//! Wire-level failures are not interpreted by this layer: no retry, no
//! error-code taxonomy. The error carries the store's message and, when an
//! adapter has one, the underlying source error for callers that want to
//! downcast.

use std::fmt;

/// A failure reported by the store or its transport.
#[derive(Debug)]
pub struct StoreError {
    /// A human-readable message from the store or adapter.
    pub message: String,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new `StoreError` with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.message)
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
