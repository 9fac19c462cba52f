//! Crate-level error type.

use thiserror::Error;

use crate::config::SettingsError;
use crate::executor::ExecutorError;
use crate::query::QueryError;
use crate::schema::SchemaError;

/// Result type for enrichment operations.
pub type EnrichResult<T> = Result<T, EnrichError>;

/// Errors that abort an enrichment.
///
/// Only the primary query can fail a request. Fan-out failures degrade to
/// null sub-objects and are reported through
/// [`PartialEnrichmentWarning`](crate::enrich::PartialEnrichmentWarning).
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("primary fetch failed: {0}")]
    RemoteFetch(#[from] ExecutorError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("relation alias '{0}' is used more than once")]
    DuplicateAlias(String),

    /// The alias would replace one of the primary record's own fields.
    #[error("relation alias '{alias}' collides with a field of table {table}")]
    AliasShadowsField { alias: String, table: String },
}
