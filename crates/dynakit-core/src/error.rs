//! Error types for schema validation, key handling, and query execution.
//!
//! Schema and key errors are programming or configuration mistakes: they are
//! raised synchronously before any network call and are never retried. Store
//! failures pass through as the opaque [`StoreError`].

use thiserror::Error;

use dynakit_model::StoreError;

/// Errors detected when a key schema is constructed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A key side declares no logical parts at all.
    #[error("key side '{side}' declares no parts")]
    EmptyKeyParts {
        /// The physical attribute name of the offending side.
        side: String,
    },
    /// A key side joins multiple parts but names no separator.
    #[error("key side '{side}' has {count} parts but no separator")]
    MissingSeparator {
        /// The physical attribute name of the offending side.
        side: String,
        /// How many parts the side declares.
        count: usize,
    },
}

/// Errors detected while encoding, decoding, or validating keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// A declared key part was not supplied to an encode call.
    #[error("missing key part '{part}' for attribute '{attr}'")]
    MissingKeyPart {
        /// The physical attribute being encoded.
        attr: String,
        /// The absent logical part.
        part: String,
    },
    /// A physical key string did not split into the declared number of parts.
    #[error("key '{value}' for attribute '{attr}' does not split into {expected} parts")]
    MalformedKey {
        /// The physical attribute being decoded.
        attr: String,
        /// The offending physical string.
        value: String,
        /// The declared part count.
        expected: usize,
    },
    /// A returned record lacks a key attribute or carries a non-string one.
    #[error("key attribute '{attr}' is missing or not a string")]
    InvalidKeyAttribute {
        /// The physical attribute name.
        attr: String,
    },
    /// A sort-key operation was requested but the schema defines no sort side.
    #[error("schema defines no sort key")]
    SortKeyNotDefined,
    /// A partial key prefix was requested with no fields at all.
    #[error("no key parts supplied for attribute '{attr}'")]
    EmptyKeyCondition {
        /// The physical attribute name.
        attr: String,
    },
    /// A partial key prefix does not start with the first declared part.
    #[error("first key part '{part}' must be included")]
    FirstPartMissing {
        /// The first declared part.
        part: String,
    },
    /// A partial key prefix skips a middle part while including a later one.
    #[error("key part '{part}' must be included before later parts")]
    PartSkipped {
        /// The first missing contiguous part.
        part: String,
    },
    /// A supplied field is not a declared part of the side at all.
    #[error("'{field}' is not a declared part of attribute '{attr}'")]
    UnknownKeyPart {
        /// The physical attribute name.
        attr: String,
        /// The undeclared field.
        field: String,
    },
}

/// Any failure surfaced while running a query through the paginator.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Schema construction failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Key encoding/decoding/validation failure.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// A store-side failure, propagated unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}
