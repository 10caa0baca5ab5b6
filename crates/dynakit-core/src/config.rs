//! Paginator configuration.

use std::env;

/// Configuration for [`crate::paginate::CursorPaginator`].
#[derive(Debug, Clone)]
pub struct PaginatorConfig {
    /// Page size used when a page request names no limit.
    pub default_limit: usize,
}

impl PaginatorConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            default_limit: env_usize("DYNAKIT_DEFAULT_PAGE_SIZE", 25),
        }
    }
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self { default_limit: 25 }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
