//! Query request and response shapes.
//!
//! `QueryRequest` uses `PascalCase` JSON field naming to match the store's
//! wire protocol. Optional fields are omitted when `None`, empty maps are
//! omitted to produce minimal payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attr_value::AttrValue;

/// A single query against the store, accumulated incrementally.
///
/// This is the mutable per-query accumulator: the key condition, filter and
/// projection clauses are attached by the builders in `dynakit-core`, and the
/// paginator clones the finished request once per page, touching only the
/// limit, sort direction, and exclusive start key. It owns no connection
/// resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryRequest {
    /// The name of the table to query.
    pub table_name: String,

    /// The name of a secondary index to query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// The condition selecting the partition and constraining the sort key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,

    /// A post-fetch condition over non-key attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// The attributes to return for each item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Substitution tokens for attribute names in an expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in an expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttrValue>,

    /// Specifies the order of sort-key traversal. `true` (default) for
    /// ascending, `false` for descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// The maximum number of items to evaluate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    /// The primary key of the item this query starts after. Used for
    /// pagination.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub exclusive_start_key: HashMap<String, AttrValue>,
}

impl QueryRequest {
    /// Creates a request against the given table.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Merges placeholder names into the request's name table.
    ///
    /// New entries win on key collision; existing unrelated entries are
    /// preserved.
    pub fn merge_names<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.expression_attribute_names.extend(names);
    }

    /// Merges placeholder values into the request's value table.
    ///
    /// New entries win on key collision; existing unrelated entries are
    /// preserved.
    pub fn merge_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, AttrValue)>,
    {
        self.expression_attribute_values.extend(values);
    }

    /// Appends a clause to the key condition expression, joined with `AND`.
    pub fn append_key_condition(&mut self, clause: &str) {
        self.key_condition_expression = Some(match self.key_condition_expression.take() {
            Some(existing) => format!("{existing} AND {clause}"),
            None => clause.to_owned(),
        });
    }

    /// Appends a clause to the filter expression.
    ///
    /// A pre-existing filter is kept and the new clause is attached as
    /// `AND (clause)`.
    pub fn append_filter(&mut self, clause: &str) {
        self.filter_expression = Some(match self.filter_expression.take() {
            Some(existing) => format!("{existing} AND ({clause})"),
            None => clause.to_owned(),
        });
    }
}

/// A query response window as returned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResponse {
    /// The items matching the query, in store order.
    #[serde(default)]
    pub items: Vec<HashMap<String, AttrValue>>,

    /// The number of items returned after any filter was applied.
    #[serde(default)]
    pub count: i32,

    /// The number of items evaluated before any filter was applied.
    #[serde(default)]
    pub scanned_count: i32,

    /// The primary key of the item where the store stopped, when the window
    /// was truncated. Absent means the store ran out of items.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_evaluated_key: HashMap<String, AttrValue>,
}
