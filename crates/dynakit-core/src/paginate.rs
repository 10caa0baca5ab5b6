//! Cursor pagination over the store's single-window query primitive.
//!
//! The store only answers "N items after key X in direction D", so
//! bidirectional has-more pagination is emulated with an over-fetch-by-one:
//! every page requests one item beyond the caller's limit, and the presence
//! of that sentinel (or of a store continuation key) is what `has_next`
//! reports. The sentinel is dropped before the page is surfaced.
//!
//! Derivation is direction-agnostic; the direction only selects the physical
//! sort order of the request.

use std::collections::HashMap;

use tracing::debug;

use dynakit_model::{AttrValue, Direction, QueryRequest};

use crate::codec::KeyFields;
use crate::config::PaginatorConfig;
use crate::error::{KeyError, QueryError};
use crate::schema::KeySchema;
use crate::store::Store;

/// A decoded record: the physical key attributes replaced by their logical
/// fields, payload attributes untouched.
pub type LogicalItem = HashMap<String, AttrValue>;

/// Parameters for one page fetch.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// The page size; the paginator's configured default applies when absent.
    pub limit: Option<usize>,
    /// Traversal direction.
    pub direction: Direction,
    /// The exclusive position to start after, from a previous page's
    /// `first_key`/`last_key`.
    pub cursor: Option<KeyFields>,
}

/// One page of decoded results.
///
/// `has_next` is an approximation when a filter is in play: filtered-out
/// items still consume the store's scan limit, so the last page of matching
/// items can carry a continuation key and report `has_next = true`.
#[derive(Debug, Clone)]
pub struct Page {
    /// The decoded items, in store order.
    pub items: Vec<LogicalItem>,
    /// Logical key of the first item, if the page is non-empty.
    pub first_key: Option<KeyFields>,
    /// Logical key of the last item, if the page is non-empty.
    pub last_key: Option<KeyFields>,
    /// Number of items after trimming the over-fetch sentinel.
    pub count: usize,
    /// Whether more items exist past this page in the fetch direction.
    pub has_next: bool,
    /// Whether this page was reached through a cursor.
    pub has_previous: bool,
    /// The direction this page was fetched in, carried through unchanged.
    pub direction: Direction,
}

/// Fetches and derives pages, one store round trip per call.
#[derive(Debug)]
pub struct CursorPaginator<'a> {
    schema: &'a KeySchema,
    config: PaginatorConfig,
}

impl<'a> CursorPaginator<'a> {
    /// Creates a paginator with the default configuration.
    #[must_use]
    pub fn new(schema: &'a KeySchema) -> Self {
        Self::with_config(schema, PaginatorConfig::default())
    }

    /// Creates a paginator with an explicit configuration.
    #[must_use]
    pub fn with_config(schema: &'a KeySchema, config: PaginatorConfig) -> Self {
        Self { schema, config }
    }

    /// Fetches one page.
    ///
    /// The base request is cloned; only the limit, sort direction, and
    /// exclusive start key differ between pages of the same logical query.
    ///
    /// # Errors
    ///
    /// Key errors surface before the store call; store failures pass through
    /// unmodified.
    pub async fn run<S>(
        &self,
        store: &S,
        request: &QueryRequest,
        page: &PageRequest,
    ) -> Result<Page, QueryError>
    where
        S: Store + ?Sized,
    {
        let limit = page.limit.unwrap_or(self.config.default_limit);

        let mut physical = request.clone();
        physical.limit = Some(i32::try_from(limit.saturating_add(1)).unwrap_or(i32::MAX));
        physical.scan_index_forward = Some(page.direction.is_forward());
        physical.exclusive_start_key = match &page.cursor {
            Some(cursor) => self.start_key(cursor)?,
            None => HashMap::new(),
        };

        let response = store.query(&physical).await?;

        let new_cursor = if response.last_evaluated_key.is_empty() {
            None
        } else {
            Some(self.decode_key(&response.last_evaluated_key)?)
        };
        let mut items = Vec::with_capacity(response.items.len());
        for record in response.items {
            items.push(self.decode_record(record)?);
        }

        if items.is_empty() {
            return Ok(Page {
                items,
                first_key: None,
                last_key: None,
                count: 0,
                has_next: new_cursor.is_some(),
                has_previous: page.cursor.is_some(),
                direction: page.direction,
            });
        }

        let has_previous = page.cursor.is_some();
        let overfetched = items.len() == limit.saturating_add(1);
        let has_next = new_cursor.is_some() || overfetched;
        if overfetched {
            // The extra item only existed to answer has_next.
            items.pop();
        }

        let first_key = items.first().map(|item| self.key_fields_of(item));
        let last_key = items.last().map(|item| self.key_fields_of(item));
        let count = items.len();

        debug!(count, has_next, has_previous, "derived page");

        Ok(Page {
            items,
            first_key,
            last_key,
            count,
            has_next,
            has_previous,
            direction: page.direction,
        })
    }

    /// Encodes a logical cursor into the physical exclusive-start-key map.
    fn start_key(&self, cursor: &KeyFields) -> Result<HashMap<String, AttrValue>, KeyError> {
        let mut key = HashMap::with_capacity(2);
        let partition = self.schema.partition();
        key.insert(
            partition.name().to_owned(),
            AttrValue::S(partition.encode(cursor)?),
        );
        if let Some(sort) = self.schema.sort() {
            key.insert(sort.name().to_owned(), AttrValue::S(sort.encode(cursor)?));
        }
        Ok(key)
    }

    /// Decodes a physical key attribute map back into logical key fields.
    fn decode_key(&self, physical: &HashMap<String, AttrValue>) -> Result<KeyFields, KeyError> {
        let partition = self.schema.partition();
        let mut fields = self.decode_side(physical, partition)?;
        if let Some(sort) = self.schema.sort() {
            fields.extend(self.decode_side(physical, sort)?);
        }
        Ok(fields)
    }

    fn decode_side(
        &self,
        physical: &HashMap<String, AttrValue>,
        side: &crate::schema::KeySide,
    ) -> Result<KeyFields, KeyError> {
        let raw = physical
            .get(side.name())
            .and_then(AttrValue::as_s)
            .ok_or_else(|| KeyError::InvalidKeyAttribute {
                attr: side.name().to_owned(),
            })?;
        side.decode(raw)
    }

    /// Replaces a record's physical key attributes with their logical fields.
    fn decode_record(&self, mut record: HashMap<String, AttrValue>) -> Result<LogicalItem, KeyError> {
        let fields = self.decode_key(&record)?;
        record.remove(self.schema.partition().name());
        if let Some(sort) = self.schema.sort() {
            record.remove(sort.name());
        }
        for (field, value) in fields {
            record.insert(field, AttrValue::S(value));
        }
        Ok(record)
    }

    /// Collects the schema's key fields out of a decoded item.
    fn key_fields_of(&self, item: &LogicalItem) -> KeyFields {
        let mut fields = KeyFields::new();
        let mut collect = |parts: &[String]| {
            for part in parts {
                if let Some(value) = item.get(part).and_then(AttrValue::as_s) {
                    fields.insert(part.clone(), value.to_owned());
                }
            }
        };
        collect(self.schema.partition().parts());
        if let Some(sort) = self.schema.sort() {
            collect(sort.parts());
        }
        fields
    }
}
