//! Expression synthesis: filter and projection clauses with collision-free
//! placeholder tables.
//!
//! Raw attribute names may collide with the store's reserved words or be
//! reused across clauses, so every name and literal that enters an expression
//! goes behind a placeholder resolved through the request's side tables. The
//! allocator in [`placeholder`] owns uniqueness; [`builder`] turns logical
//! predicates and projections into clauses.

pub mod builder;
pub mod placeholder;

pub use builder::{CmpOp, ExpressionBuilder, FieldCondition, Predicates};
pub use placeholder::PlaceholderTable;
