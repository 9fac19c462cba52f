//! Query construction errors.

use thiserror::Error;

use super::descriptor::FilterOp;

/// Result type for query construction.
pub type QueryResult<T> = Result<T, QueryError>;

/// A query the remote store cannot express.
///
/// Raised at construction time; a query that fails here is never sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown field {field} on table {table}")]
    UnknownField { table: String, field: String },

    /// The store rejects `$filter` on this field (e.g. primary keys).
    #[error("field {field} on table {table} cannot be filtered")]
    UnfilterableField { table: String, field: String },

    #[error("unknown relation {relation} on table {table}")]
    UnknownRelation { table: String, relation: String },

    /// Only single-hop relations can be expanded inline.
    #[error("relation {relation} on table {table} requires a client-side join and cannot be expanded")]
    ClientJoinExpansion { table: String, relation: String },

    #[error("only one relation can be expanded per query on table {table}")]
    MultipleExpansions { table: String },

    #[error("filter value for {field} must be a scalar")]
    NonScalarValue { field: String },

    #[error("operator {op} cannot be applied to the value given for {field}")]
    InvalidOperand { field: String, op: FilterOp },

    #[error("page size for table {table} must be at least 1")]
    EmptyPage { table: String },

    #[error("projection on table {table} selects no fields")]
    EmptyProjection { table: String },
}
