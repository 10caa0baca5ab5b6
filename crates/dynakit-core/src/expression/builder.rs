//! Builds filter and projection expressions from logical predicates.

use std::collections::BTreeMap;

use dynakit_model::{Literal, QueryRequest};

use crate::expression::placeholder::PlaceholderTable;
use crate::schema::KeySchema;

/// A comparison operator usable in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// The operator's expression symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// A short tag used in value placeholder spelling.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Parses the expression symbol back into an operator.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }
}

/// The condition attached to one field of a predicate map.
#[derive(Debug, Clone)]
pub enum FieldCondition {
    /// A bare value: direct equality.
    Value(Literal),
    /// One or more (operator, literal) pairs, all of which must hold.
    Ops(Vec<(CmpOp, Literal)>),
}

impl FieldCondition {
    /// A bare-value equality condition.
    #[must_use]
    pub fn value(literal: impl Into<Literal>) -> Self {
        Self::Value(literal.into())
    }

    /// A single (operator, literal) condition.
    #[must_use]
    pub fn op(op: CmpOp, literal: impl Into<Literal>) -> Self {
        Self::Ops(vec![(op, literal.into())])
    }
}

/// An ordered predicate map: field name to condition.
///
/// Ordered so that one builder invocation always emits the same expression
/// and placeholder tables for the same input.
pub type Predicates = BTreeMap<String, FieldCondition>;

/// Synthesizes filter and projection expressions into a [`QueryRequest`].
///
/// One builder holds one placeholder table, so all clauses produced by the
/// same invocation share name placeholders and never collide. Methods take
/// the request by reference and return the updated copy.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    table: PlaceholderTable,
}

impl ExpressionBuilder {
    /// Creates a builder with an empty placeholder table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a filter built from the predicate map.
    ///
    /// Each field contributes one clause per operator; clauses are joined by
    /// `AND`. When the request already carries a filter, the new clause chain
    /// is appended as `AND (…)`. An empty predicate map leaves the request
    /// unchanged.
    #[must_use]
    pub fn filter(&mut self, request: &QueryRequest, predicates: &Predicates) -> QueryRequest {
        let mut clauses = Vec::new();
        for (field, condition) in predicates {
            let name = self.table.name(field);
            match condition {
                FieldCondition::Value(literal) => {
                    let value = self.table.value(field, CmpOp::Eq.tag(), literal.to_attr());
                    clauses.push(format!("{name} {} {value}", CmpOp::Eq.symbol()));
                }
                FieldCondition::Ops(ops) => {
                    for (op, literal) in ops {
                        let value = self.table.value(field, op.tag(), literal.to_attr());
                        clauses.push(format!("{name} {} {value}", op.symbol()));
                    }
                }
            }
        }

        let mut updated = request.clone();
        if !clauses.is_empty() {
            updated.append_filter(&clauses.join(" AND "));
            self.merge_into(&mut updated);
        }
        updated
    }

    /// Attaches a projection for the requested fields.
    ///
    /// The physical partition attribute and, when defined, the physical sort
    /// attribute are always projected so that every returned record can be
    /// decoded back into a cursor. Every projected attribute sits behind a
    /// name placeholder, never a raw name.
    #[must_use]
    pub fn projection(
        &mut self,
        request: &QueryRequest,
        schema: &KeySchema,
        fields: &[String],
    ) -> QueryRequest {
        let mut ordered: Vec<&str> = vec![schema.partition().name()];
        if let Some(sort) = schema.sort() {
            ordered.push(sort.name());
        }
        for field in fields {
            if !ordered.contains(&field.as_str()) {
                ordered.push(field);
            }
        }

        let placeholders: Vec<String> = ordered.iter().map(|f| self.table.name(f)).collect();

        let mut updated = request.clone();
        updated.projection_expression = Some(placeholders.join(", "));
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
