//! Schema configuration errors.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors in the static table and relation knowledge.
///
/// These are configuration errors: they mean the catalog does not describe
/// a table or relation the caller relies on, never that the remote store
/// misbehaved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown field {field} on table {table}")]
    UnknownField { table: String, field: String },

    #[error("unknown relation {relation} on table {table}")]
    UnknownRelation { table: String, relation: String },

    #[error("table {0} is defined twice")]
    DuplicateTable(String),

    #[error("relation {relation} on table {table} is defined twice")]
    DuplicateRelation { table: String, relation: String },

    /// The table has no field the store can filter on to fetch a single row.
    #[error("table {0} has no filterable lookup key")]
    NoLookupKey(String),

    #[error("relation {relation} on table {table} has an invalid hop: {reason}")]
    InvalidHop {
        table: String,
        relation: String,
        reason: String,
    },
}

impl SchemaError {
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    pub fn unknown_relation(table: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnknownRelation {
            table: table.into(),
            relation: relation.into(),
        }
    }
}
