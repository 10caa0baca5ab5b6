//! Key-condition synthesis: partition equality plus one sort-key shape.
//!
//! Every method takes the request by reference and returns a fresh
//! [`QueryRequest`] with the clause appended (copy-on-write), so concurrent
//! callers never observe a partially-built request. Comparison shapes encode
//! the full sort key; `begins_with` and `between` accept any validated
//! contiguous prefix of the sort parts.

use dynakit_model::{AttrValue, QueryRequest};

use crate::codec::KeyFields;
use crate::error::KeyError;
use crate::expression::placeholder::PlaceholderTable;
use crate::expression::CmpOp;
use crate::schema::KeySchema;

/// Builds the key-condition expression of a query.
#[derive(Debug)]
pub struct KeyConditionBuilder<'a> {
    schema: &'a KeySchema,
    table: PlaceholderTable,
}

impl<'a> KeyConditionBuilder<'a> {
    /// Creates a builder over a validated schema.
    #[must_use]
    pub fn new(schema: &'a KeySchema) -> Self {
        Self {
            schema,
            table: PlaceholderTable::new(),
        }
    }

    /// Selects the partition: `#pk = :pk_eq` over the encoded partition key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MissingKeyPart`] when a declared partition part is
    /// absent from `key`.
    pub fn partition(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        let side = self.schema.partition();
        let encoded = side.encode(key)?;
        Ok(self.push_cmp(request, side.name(), CmpOp::Eq, encoded))
    }

    /// Sort key equals the encoded value.
    pub fn equals(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        self.sort_cmp(request, key, CmpOp::Eq)
    }

    /// Sort key is strictly greater than the encoded value.
    pub fn greater_than(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        self.sort_cmp(request, key, CmpOp::Gt)
    }

    /// Sort key is strictly lower than the encoded value.
    pub fn lower_than(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        self.sort_cmp(request, key, CmpOp::Lt)
    }

    /// Sort key is greater than or equal to the encoded value.
    pub fn greater_than_or_equal(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        self.sort_cmp(request, key, CmpOp::Ge)
    }

    /// Sort key is lower than or equal to the encoded value.
    pub fn lower_than_or_equal(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        self.sort_cmp(request, key, CmpOp::Le)
    }

    /// Sort key begins with the encoded partial prefix:
    /// `begins_with(#sk, :sk_begins)`.
    ///
    /// # Errors
    ///
    /// Fails with [`KeyError::SortKeyNotDefined`] when the schema has no sort
    /// side, or with a partial-order error when `partial` is not a contiguous
    /// leading prefix.
    pub fn begins_with(
        &mut self,
        request: &QueryRequest,
        partial: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        let side = self.schema.require_sort()?;
        let encoded = side.encode_partial(partial)?;
        let name = self.table.name(side.name());
        let value = self
            .table
            .value(side.name(), "begins", AttrValue::S(encoded));

        let mut updated = request.clone();
        updated.append_key_condition(&format!("begins_with({name}, {value})"));
        self.merge_into(&mut updated);
        Ok(updated)
    }

    /// Sort key lies between two encoded boundaries (inclusive):
    /// `#sk BETWEEN :sk_lo AND :sk_hi`.
    ///
    /// Both boundaries may be partial prefixes.
    pub fn between(
        &mut self,
        request: &QueryRequest,
        from: &KeyFields,
        to: &KeyFields,
    ) -> Result<QueryRequest, KeyError> {
        let side = self.schema.require_sort()?;
        let low = side.encode_partial(from)?;
        let high = side.encode_partial(to)?;
        let name = self.table.name(side.name());
        let lo = self.table.value(side.name(), "lo", AttrValue::S(low));
        let hi = self.table.value(side.name(), "hi", AttrValue::S(high));

        let mut updated = request.clone();
        updated.append_key_condition(&format!("{name} BETWEEN {lo} AND {hi}"));
        self.merge_into(&mut updated);
        Ok(updated)
    }

    fn sort_cmp(
        &mut self,
        request: &QueryRequest,
        key: &KeyFields,
        op: CmpOp,
    ) -> Result<QueryRequest, KeyError> {
        let side = self.schema.require_sort()?;
        let encoded = side.encode(key)?;
        let name = side.name().to_owned();
        Ok(self.push_cmp(request, &name, op, encoded))
    }

    fn push_cmp(
        &mut self,
        request: &QueryRequest,
        attr: &str,
        op: CmpOp,
        encoded: String,
    ) -> QueryRequest {
        let name = self.table.name(attr);
        let value = self.table.value(attr, op.tag(), AttrValue::S(encoded));

        let mut updated = request.clone();
        updated.append_key_condition(&format!("{name} {} {value}", op.symbol()));
        self.merge_into(&mut updated);
        updated
    }

    fn merge_into(&self, request: &mut QueryRequest) {
        request.merge_names(
            self.table
                .names()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        request.merge_values(
            self.table
                .values()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::KeySide;

    fn schema() -> KeySchema {
        KeySchema::new(
            KeySide::single("pk", "tenant"),
            Some(KeySide::composite("sk", ["kind", "id"], "#")),
        )
        .unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> KeyFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_should_build_partition_equality() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let request = builder
            .partition(&QueryRequest::new("t"), &fields(&[("tenant", "acme")]))
            .unwrap();
        assert_eq!(
            request.key_condition_expression.as_deref(),
            Some("#pk = :pk_eq")
        );
        assert_eq!(
            request.expression_attribute_values[":pk_eq"],
            AttrValue::S("acme".to_owned())
        );
    }

    #[test]
    fn test_should_append_sort_comparison_after_partition() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let request = builder
            .partition(&QueryRequest::new("t"), &fields(&[("tenant", "acme")]))
            .unwrap();
        let request = builder
            .greater_than_or_equal(&request, &fields(&[("kind", "order"), ("id", "100")]))
            .unwrap();
        assert_eq!(
            request.key_condition_expression.as_deref(),
            Some("#pk = :pk_eq AND #sk >= :sk_ge")
        );
        assert_eq!(
            request.expression_attribute_values[":sk_ge"],
            AttrValue::S("order#100".to_owned())
        );
    }

    #[test]
    fn test_should_not_mutate_the_input_request() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let base = QueryRequest::new("t");
        let _updated = builder
            .partition(&base, &fields(&[("tenant", "acme")]))
            .unwrap();
        assert!(base.key_condition_expression.is_none());
        assert!(base.expression_attribute_values.is_empty());
    }

    #[test]
    fn test_should_build_begins_with_from_partial_prefix() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let request = builder
            .begins_with(&QueryRequest::new("t"), &fields(&[("kind", "order")]))
            .unwrap();
        assert_eq!(
            request.key_condition_expression.as_deref(),
            Some("begins_with(#sk, :sk_begins)")
        );
        assert_eq!(
            request.expression_attribute_values[":sk_begins"],
            AttrValue::S("order".to_owned())
        );
    }

    #[test]
    fn test_should_build_between_with_two_boundaries() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let request = builder
            .between(
                &QueryRequest::new("t"),
                &fields(&[("kind", "order"), ("id", "100")]),
                &fields(&[("kind", "order"), ("id", "200")]),
            )
            .unwrap();
        assert_eq!(
            request.key_condition_expression.as_deref(),
            Some("#sk BETWEEN :sk_lo AND :sk_hi")
        );
        assert_eq!(
            request.expression_attribute_values[":sk_lo"],
            AttrValue::S("order#100".to_owned())
        );
        assert_eq!(
            request.expression_attribute_values[":sk_hi"],
            AttrValue::S("order#200".to_owned())
        );
    }

    #[test]
    fn test_should_fail_sort_shapes_without_sort_side() {
        let schema = KeySchema::new(KeySide::single("pk", "id"), None).unwrap();
        let mut builder = KeyConditionBuilder::new(&schema);
        let err = builder
            .equals(&QueryRequest::new("t"), &fields(&[("id", "1")]))
            .unwrap_err();
        assert!(matches!(err, KeyError::SortKeyNotDefined));
    }

    #[test]
    fn test_should_reject_non_prefix_partial() {
        let schema = schema();
        let mut builder = KeyConditionBuilder::new(&schema);
        let err = builder
            .begins_with(&QueryRequest::new("t"), &fields(&[("id", "100")]))
            .unwrap_err();
        assert!(matches!(err, KeyError::FirstPartMissing { ref part } if part == "kind"));
    }
}
