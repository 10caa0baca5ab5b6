//! Composite-key encoding and decoding.
//!
//! A [`KeySide`] folds its ordered logical parts into one physical string by
//! joining them with the side's separator, and unfolds a physical string by
//! splitting it back into exactly as many segments as declared parts. Part
//! values must not themselves contain the separator; the round trip
//! `decode(encode(k)) == k` holds for any key free of it.
//!
//! Range queries never need the full key: they may address any contiguous
//! leading prefix of the declared part order. [`KeySide::validate_partial`]
//! enforces that prefix rule, and [`KeySide::encode_partial`] builds the
//! boundary string for `begins_with` / `between` conditions from it.

use std::collections::HashMap;

use crate::error::KeyError;
use crate::schema::KeySide;

/// Logical key fields: field name to string value.
pub type KeyFields = HashMap<String, String>;

impl KeySide {
    /// Encodes a fully-populated logical key into the physical string.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MissingKeyPart`] when any declared part is absent
    /// from `fields`.
    pub fn encode(&self, fields: &KeyFields) -> Result<String, KeyError> {
        let mut segments = Vec::with_capacity(self.parts().len());
        for part in self.parts() {
            let value = fields.get(part).ok_or_else(|| KeyError::MissingKeyPart {
                attr: self.name().to_owned(),
                part: part.clone(),
            })?;
            segments.push(value.as_str());
        }
        match self.separator() {
            Some(sep) => Ok(segments.join(sep)),
            None => Ok(segments[0].to_owned()),
        }
    }

    /// Decodes a physical key string back into its logical parts.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedKey`] when the string does not split into
    /// the declared number of segments.
    pub fn decode(&self, physical: &str) -> Result<KeyFields, KeyError> {
        let Some(sep) = self.separator() else {
            let mut fields = KeyFields::with_capacity(1);
            fields.insert(self.parts()[0].clone(), physical.to_owned());
            return Ok(fields);
        };

        let segments: Vec<&str> = physical.split(sep).collect();
        if segments.len() != self.parts().len() {
            return Err(KeyError::MalformedKey {
                attr: self.name().to_owned(),
                value: physical.to_owned(),
                expected: self.parts().len(),
            });
        }

        Ok(self
            .parts()
            .iter()
            .zip(segments)
            .map(|(part, segment)| (part.clone(), segment.to_owned()))
            .collect())
    }

    /// Validates that `fields` form a contiguous leading prefix of the
    /// declared part order, returning the prefix parts in declared order.
    ///
    /// Range predicates are prefix-only: for parts `[a, b, c]` the valid
    /// shapes are `{a}`, `{a, b}`, and `{a, b, c}`, never `{b}` or `{a, c}`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::EmptyKeyCondition`] when no fields are supplied.
    /// - [`KeyError::UnknownKeyPart`] when a field is not a declared part.
    /// - [`KeyError::FirstPartMissing`] when the first declared part is absent.
    /// - [`KeyError::PartSkipped`] naming the first missing contiguous part.
    pub fn validate_partial(&self, fields: &KeyFields) -> Result<Vec<&str>, KeyError> {
        let mut indices = Vec::with_capacity(fields.len());
        for field in fields.keys() {
            let idx = self
                .parts()
                .iter()
                .position(|p| p == field)
                .ok_or_else(|| KeyError::UnknownKeyPart {
                    attr: self.name().to_owned(),
                    field: field.clone(),
                })?;
            indices.push(idx);
        }
        if indices.is_empty() {
            return Err(KeyError::EmptyKeyCondition {
                attr: self.name().to_owned(),
            });
        }
        indices.sort_unstable();

        if indices[0] != 0 {
            return Err(KeyError::FirstPartMissing {
                part: self.parts()[0].clone(),
            });
        }
        for (expected, &idx) in indices.iter().enumerate().skip(1) {
            if idx != expected {
                return Err(KeyError::PartSkipped {
                    part: self.parts()[expected].clone(),
                });
            }
        }

        Ok(indices
            .into_iter()
            .map(|idx| self.parts()[idx].as_str())
            .collect())
    }

    /// Encodes a validated partial prefix into its physical boundary string.
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`KeySide::validate_partial`].
    pub fn encode_partial(&self, fields: &KeyFields) -> Result<String, KeyError> {
        let prefix = self.validate_partial(fields)?;
        let segments: Vec<&str> = prefix
            .iter()
            .map(|part| fields[*part].as_str())
            .collect();
        match self.separator() {
            Some(sep) => Ok(segments.join(sep)),
            None => Ok(segments[0].to_owned()),
        }
    }
}
