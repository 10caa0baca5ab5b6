//! Placeholder allocation for expression attribute names and values.
//!
//! Name placeholders (`#stem`) map to real attribute names; value
//! placeholders (`:stem_tag`) map to typed literals. Allocation is
//! deterministic within one table: the same field always yields the same
//! name placeholder, and distinct fields whose sanitized stems collide are
//! disambiguated with a monotonically increasing suffix, so no input
//! spelling can produce a collision.

use std::collections::HashMap;

use dynakit_model::AttrValue;

/// Reduces a field name to the characters legal inside a placeholder.
///
/// Path separators, reserved markers, and anything else outside
/// `[A-Za-z0-9_]` become underscores; a stem that would not start with a
/// letter is prefixed so it always does.
#[must_use]
pub fn sanitize(field: &str) -> String {
    let mut stem: String = field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !stem.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        stem.insert(0, 'f');
    }
    stem
}

/// Accumulates placeholder allocations for one builder invocation.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
    names: HashMap<String, String>,
    by_field: HashMap<String, String>,
    values: HashMap<String, AttrValue>,
    next_id: usize,
}

impl PlaceholderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name placeholder for a real field, allocating on first use.
    ///
    /// The real field name is preserved in the name table so the store
    /// resolves the placeholder correctly regardless of sanitization.
    pub fn name(&mut self, field: &str) -> String {
        if let Some(existing) = self.by_field.get(field) {
            return existing.clone();
        }
        let stem = sanitize(field);
        let mut placeholder = format!("#{stem}");
        while self.names.contains_key(&placeholder) {
            placeholder = format!("#{stem}_{}", self.next_id);
            self.next_id += 1;
        }
        self.names.insert(placeholder.clone(), field.to_owned());
        self.by_field.insert(field.to_owned(), placeholder.clone());
        placeholder
    }

    /// Allocates a value placeholder for a (field, tag) pair.
    ///
    /// Each call allocates a fresh placeholder, so the same field under two
    /// operators yields two distinct entries.
    pub fn value(&mut self, field: &str, tag: &str, value: AttrValue) -> String {
        let stem = sanitize(field);
        let mut placeholder = format!(":{stem}_{tag}");
        while self.values.contains_key(&placeholder) {
            placeholder = format!(":{stem}_{tag}_{}", self.next_id);
            self.next_id += 1;
        }
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// The accumulated name table (placeholder to real field).
    #[must_use]
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// The accumulated value table (placeholder to literal).
    #[must_use]
    pub fn values(&self) -> &HashMap<String, AttrValue> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_sanitize_illegal_characters() {
        assert_eq!(sanitize("age"), "age");
        assert_eq!(sanitize("user.name"), "user_name");
        assert_eq!(sanitize("path/to#field"), "path_to_field");
        assert_eq!(sanitize("0col"), "f0col");
    }

    #[test]
    fn test_should_reuse_name_placeholder_per_field() {
        let mut table = PlaceholderTable::new();
        let a = table.name("age");
        let b = table.name("age");
        assert_eq!(a, b);
        assert_eq!(table.names()[&a], "age");
    }

    #[test]
    fn test_should_disambiguate_colliding_stems() {
        let mut table = PlaceholderTable::new();
        let a = table.name("user.name");
        let b = table.name("user#name");
        assert_ne!(a, b);
        assert_eq!(table.names()[&a], "user.name");
        assert_eq!(table.names()[&b], "user#name");
    }

    #[test]
    fn test_should_allocate_distinct_value_placeholders_per_operator() {
        let mut table = PlaceholderTable::new();
        let gt = table.value("age", "gt", AttrValue::N("18".to_owned()));
        let lt = table.value("age", "lt", AttrValue::N("65".to_owned()));
        assert_ne!(gt, lt);
        assert_eq!(table.values()[&gt], AttrValue::N("18".to_owned()));
        assert_eq!(table.values()[&lt], AttrValue::N("65".to_owned()));
    }

    #[test]
    fn test_should_bump_repeated_value_allocations() {
        let mut table = PlaceholderTable::new();
        let first = table.value("age", "gt", AttrValue::N("18".to_owned()));
        let second = table.value("age", "gt", AttrValue::N("21".to_owned()));
        assert_ne!(first, second);
    }
}
