//! In-memory store implementation for tests and local development.
//!
//! Partition-level concurrency via [`DashMap`]; within a partition, records
//! sit in a `BTreeMap` keyed by the physical sort string, so range queries
//! and ordered scans come for free. Tables without a sort attribute use an
//! empty-string sentinel as the single map key per partition.
//!
//! The store consumes the same wire shapes a real backend would: it parses
//! the key-condition and filter expressions (the subset the builders emit),
//! resolves placeholders through the request's side tables, and applies the
//! store-order rule that the limit is consumed before the filter runs, so
//! filtered pages can return a continuation key even when few items match.

mod condition;

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use dynakit_model::{AttrValue, QueryRequest, QueryResponse, StoreError};

use crate::expression::CmpOp;
use crate::store::Store;

use condition::{Clause, ClauseTest};

type Record = HashMap<String, AttrValue>;

/// An in-memory partition-key/sort-key store.
#[derive(Debug)]
pub struct MemoryStore {
    partition_attr: String,
    sort_attr: Option<String>,
    data: DashMap<String, BTreeMap<String, Record>>,
}

impl MemoryStore {
    /// Creates an empty store with the given physical key attributes.
    #[must_use]
    pub fn new(partition_attr: impl Into<String>, sort_attr: Option<&str>) -> Self {
        Self {
            partition_attr: partition_attr.into(),
            sort_attr: sort_attr.map(ToOwned::to_owned),
            data: DashMap::new(),
        }
    }

    /// Inserts or replaces a record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a key attribute is missing or not a
    /// string.
    pub fn put(&self, record: Record) -> Result<(), StoreError> {
        let pk = self.string_attr(&record, &self.partition_attr)?;
        let sk = match &self.sort_attr {
            Some(attr) => self.string_attr(&record, attr)?,
            None => String::new(),
        };
        debug!(partition = %pk, sort = %sk, "stored record");
        self.data.entry(pk).or_default().insert(sk, record);
        Ok(())
    }

    /// The number of records across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn string_attr(&self, record: &Record, attr: &str) -> Result<String, StoreError> {
        record
            .get(attr)
            .and_then(AttrValue::as_s)
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                StoreError::new(format!("record is missing string key attribute '{attr}'"))
            })
    }

    /// Splits parsed key-condition clauses into the partition value and the
    /// optional sort condition.
    fn split_key_clauses(&self, clauses: Vec<Clause>) -> Result<(String, Option<SortCond>), StoreError> {
        let mut partition = None;
        let mut sort = None;
        for clause in clauses {
            if clause.attr == self.partition_attr {
                match clause.test {
                    ClauseTest::Cmp(CmpOp::Eq, AttrValue::S(v)) if partition.is_none() => {
                        partition = Some(v);
                    }
                    _ => {
                        return Err(StoreError::new(
                            "partition key supports a single string equality condition",
                        ));
                    }
                }
            } else if self.sort_attr.as_deref() == Some(clause.attr.as_str()) {
                if sort.is_some() {
                    return Err(StoreError::new(
                        "key condition supports at most one sort key clause",
                    ));
                }
                sort = Some(SortCond::try_from(clause.test)?);
            } else {
                return Err(StoreError::new(format!(
                    "'{}' is not a key attribute of this table",
                    clause.attr
                )));
            }
        }
        let partition = partition
            .ok_or_else(|| StoreError::new("key condition must select a partition"))?;
        Ok((partition, sort))
    }

    /// Collects up to `limit` physical sort keys and records from a
    /// partition, honoring direction and the exclusive start key.
    fn collect_window(
        partition: &BTreeMap<String, Record>,
        sort: Option<&SortCond>,
        scan_forward: bool,
        limit: usize,
        start_after: Option<&str>,
    ) -> Vec<(String, Record)> {
        let (mut lower, mut upper, prefix) = match sort {
            None => (Bound::Unbounded, Bound::Unbounded, None),
            Some(SortCond::Cmp(op, v)) => match op {
                CmpOp::Eq => (Bound::Included(v.clone()), Bound::Included(v.clone()), None),
                CmpOp::Lt => (Bound::Unbounded, Bound::Excluded(v.clone()), None),
                CmpOp::Le => (Bound::Unbounded, Bound::Included(v.clone()), None),
                CmpOp::Gt => (Bound::Excluded(v.clone()), Bound::Unbounded, None),
                CmpOp::Ge => (Bound::Included(v.clone()), Bound::Unbounded, None),
                CmpOp::Ne => (Bound::Unbounded, Bound::Unbounded, None),
            },
            Some(SortCond::Between(lo, hi)) => (
                Bound::Included(lo.clone()),
                Bound::Included(hi.clone()),
                None,
            ),
            Some(SortCond::BeginsWith(p)) => {
                let upper = prefix_upper_bound(p)
                    .map_or(Bound::Unbounded, Bound::Excluded);
                (Bound::Included(p.clone()), upper, Some(p.clone()))
            }
        };

        if let Some(start) = start_after {
            if scan_forward {
                let tighten = match &lower {
                    Bound::Unbounded => true,
                    Bound::Included(l) | Bound::Excluded(l) => start >= l.as_str(),
                };
                if tighten {
                    lower = Bound::Excluded(start.to_owned());
                }
            } else {
                let tighten = match &upper {
                    Bound::Unbounded => true,
                    Bound::Included(u) | Bound::Excluded(u) => start <= u.as_str(),
                };
                if tighten {
                    upper = Bound::Excluded(start.to_owned());
                }
            }
        }

        if bounds_cross(&lower, &upper) {
            return Vec::new();
        }

        let matches_prefix = |key: &String| {
            prefix
                .as_deref()
                .is_none_or(|p| key.starts_with(p))
        };

        if scan_forward {
            partition
                .range((lower, upper))
                .filter(|(k, _)| matches_prefix(k))
                .take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        } else {
            partition
                .range((lower, upper))
                .rev()
                .filter(|(k, _)| matches_prefix(k))
                .take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
    }

    fn last_evaluated_key(&self, partition: &str, sort_key: &str) -> HashMap<String, AttrValue> {
        let mut key = HashMap::new();
        key.insert(
            self.partition_attr.clone(),
            AttrValue::S(partition.to_owned()),
        );
        if let Some(attr) = &self.sort_attr {
            key.insert(attr.clone(), AttrValue::S(sort_key.to_owned()));
        }
        key
    }

    fn apply_projection(
        projection: &str,
        names: &HashMap<String, String>,
        items: &mut [Record],
    ) -> Result<(), StoreError> {
        let mut keep = Vec::new();
        for token in projection.split(',') {
            let token = token.trim();
            if let Some(stripped) = token.strip_prefix('#') {
                let real = names.get(token).ok_or_else(|| {
                    StoreError::new(format!("unresolved name placeholder #{stripped}"))
                })?;
                keep.push(real.clone());
            } else {
                keep.push(token.to_owned());
            }
        }
        for item in items {
            item.retain(|attr, _| keep.iter().any(|k| k == attr));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError> {
        let key_expr = request
            .key_condition_expression
            .as_deref()
            .ok_or_else(|| StoreError::new("query requires a key condition expression"))?;
        let clauses = condition::parse(
            key_expr,
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;
        let (partition_value, sort_cond) = self.split_key_clauses(clauses)?;

        let scan_forward = request.scan_index_forward.unwrap_or(true);
        let limit = request
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        let start_after = if request.exclusive_start_key.is_empty() {
            None
        } else if let Some(attr) = &self.sort_attr {
            let sk = request
                .exclusive_start_key
                .get(attr)
                .and_then(AttrValue::as_s)
                .ok_or_else(|| {
                    StoreError::new(format!("exclusive start key is missing attribute '{attr}'"))
                })?;
            Some(sk.to_owned())
        } else {
            // Without a sort attribute a partition holds one record, and a
            // start key means it was already returned.
            return Ok(QueryResponse::default());
        };

        let window = match self.data.get(&partition_value) {
            Some(partition) => Self::collect_window(
                &partition,
                sort_cond.as_ref(),
                scan_forward,
                limit,
                start_after.as_deref(),
            ),
            None => Vec::new(),
        };

        let truncated = limit != usize::MAX && window.len() == limit;
        let last_evaluated_key = if truncated {
            window
                .last()
                .map(|(sk, _)| self.last_evaluated_key(&partition_value, sk))
                .unwrap_or_default()
        } else {
            HashMap::new()
        };

        let scanned: Vec<Record> = window.into_iter().map(|(_, record)| record).collect();
        let scanned_count = scanned.len();

        let mut items = if let Some(filter) = request.filter_expression.as_deref() {
            let filter_clauses = condition::parse(
                filter,
                &request.expression_attribute_names,
                &request.expression_attribute_values,
            )?;
            scanned
                .into_iter()
                .filter(|record| condition::eval(&filter_clauses, record))
                .collect()
        } else {
            scanned
        };

        if let Some(projection) = request.projection_expression.as_deref() {
            Self::apply_projection(projection, &request.expression_attribute_names, &mut items)?;
        }

        debug!(
            partition = %partition_value,
            scanned = scanned_count,
            returned = items.len(),
            truncated,
            "memory query"
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let (count, scanned_count) = (items.len() as i32, scanned_count as i32);
        Ok(QueryResponse {
            count,
            scanned_count,
            items,
            last_evaluated_key,
        })
    }
}

/// The sort-key condition shapes the store executes natively.
#[derive(Debug)]
enum SortCond {
    Cmp(CmpOp, String),
    Between(String, String),
    BeginsWith(String),
}

impl TryFrom<ClauseTest> for SortCond {
    type Error = StoreError;

    fn try_from(test: ClauseTest) -> Result<Self, StoreError> {
        match test {
            ClauseTest::Cmp(CmpOp::Ne, _) => Err(StoreError::new(
                "<> is not a valid sort key comparator",
            )),
            ClauseTest::Cmp(op, AttrValue::S(v)) => Ok(Self::Cmp(op, v)),
            ClauseTest::Between(AttrValue::S(lo), AttrValue::S(hi)) => Ok(Self::Between(lo, hi)),
            ClauseTest::BeginsWith(p) => Ok(Self::BeginsWith(p)),
            _ => Err(StoreError::new(
                "sort key conditions require string operands",
            )),
        }
    }
}

/// Whether an effective range is empty before asking the map for it.
fn bounds_cross(lower: &Bound<String>, upper: &Bound<String>) -> bool {
    match (lower, upper) {
        (Bound::Included(l) | Bound::Excluded(l), Bound::Included(u) | Bound::Excluded(u)) => {
            l > u
        }
        _ => false,
    }
}

/// The exclusive upper bound for a prefix scan: the prefix with its last
/// byte incremented. `None` when the prefix is empty or all `0xFF`.
fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut bytes = prefix.as_bytes().to_vec();
    while bytes.last() == Some(&0xFF) {
        bytes.pop();
    }
    if bytes.is_empty() {
        return None;
    }
    if let Some(last) = bytes.last_mut() {
        *last += 1;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
