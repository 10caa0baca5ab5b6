//! Key schema: how logical fields fold into physical key attributes.
//!
//! A schema describes one partition side and an optional sort side. Each side
//! names the physical attribute it is stored under, the ordered logical
//! fields ("parts") folded into it, and the separator joining them once there
//! is more than one part. A schema is validated at construction time and
//! immutable afterwards.

use crate::error::{KeyError, SchemaError};

/// One side of a key schema: a physical attribute built from ordered parts.
#[derive(Debug, Clone)]
pub struct KeySide {
    name: String,
    parts: Vec<String>,
    separator: Option<String>,
}

impl KeySide {
    /// A side holding a single logical field verbatim.
    #[must_use]
    pub fn single(name: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: vec![part.into()],
            separator: None,
        }
    }

    /// A side joining multiple logical fields with a separator.
    #[must_use]
    pub fn composite<I, P>(name: impl Into<String>, parts: I, separator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            parts: parts.into_iter().map(Into::into).collect(),
            separator: Some(separator.into()),
        }
    }

    /// The physical attribute name this side is stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered logical parts folded into this side.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The separator joining the parts, if one is configured.
    #[must_use]
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.parts.is_empty() {
            return Err(SchemaError::EmptyKeyParts {
                side: self.name.clone(),
            });
        }
        if self.parts.len() > 1 && self.separator.is_none() {
            return Err(SchemaError::MissingSeparator {
                side: self.name.clone(),
                count: self.parts.len(),
            });
        }
        Ok(())
    }
}

/// A validated key schema for one table or index.
#[derive(Debug, Clone)]
pub struct KeySchema {
    partition: KeySide,
    sort: Option<KeySide>,
    preserve: Vec<String>,
}

impl KeySchema {
    /// Builds and validates a schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a side declares no parts, or joins
    /// multiple parts without a separator.
    pub fn new(partition: KeySide, sort: Option<KeySide>) -> Result<Self, SchemaError> {
        partition.validate()?;
        if let Some(sort) = &sort {
            sort.validate()?;
        }
        Ok(Self {
            partition,
            sort,
            preserve: Vec::new(),
        })
    }

    /// Marks logical fields that are folded into a key but must also remain
    /// as independent stored attributes.
    #[must_use]
    pub fn with_preserve<I, P>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.preserve = fields.into_iter().map(Into::into).collect();
        self
    }

    /// The partition side.
    #[must_use]
    pub fn partition(&self) -> &KeySide {
        &self.partition
    }

    /// The sort side, if the schema defines one.
    #[must_use]
    pub fn sort(&self) -> Option<&KeySide> {
        self.sort.as_ref()
    }

    /// The sort side, or [`KeyError::SortKeyNotDefined`].
    pub fn require_sort(&self) -> Result<&KeySide, KeyError> {
        self.sort.as_ref().ok_or(KeyError::SortKeyNotDefined)
    }

    /// Whether a logical field is preserved as an independent attribute.
    #[must_use]
    pub fn is_preserved(&self, field: &str) -> bool {
        self.preserve.iter().any(|f| f == field)
    }
}
