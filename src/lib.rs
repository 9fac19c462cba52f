//! # joinery
//!
//! Relational enrichment over a remote store that expands at most one
//! relation per query.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Catalog (tables, filterability, relations)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │      QueryDescriptor (filters, $select, one $expand)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Primary result page                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [collect keys → fan out → merge]
//! ┌─────────────────────────────────────────────────────────┐
//! │        EnrichedPage (uniform sub-objects, warning)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [summary]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Bucket counts, totals and rollups              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Joins the store cannot express are decomposed into one fan-out round
//! per relation. A relation that crosses an intermediate table fans out
//! over the intermediate keys and expands the final hop inline, so the
//! number of round trips stays linear in the distinct keys of a page.

pub mod config;
pub mod enrich;
pub mod error;
pub mod executor;
pub mod model;
pub mod query;
pub mod schema;
pub mod summary;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::enrich::{
        EnrichedPage, EnrichmentPipeline, EnrichmentRequest, FanOutConfig, FanOutFetcher,
        PartialEnrichmentWarning, RelationSpec,
    };
    pub use crate::error::{EnrichError, EnrichResult};
    pub use crate::executor::{MemoryExecutor, QueryExecutor, ResultSet};
    pub use crate::model::{EnrichedEntity, Entity, KeyValue};
    pub use crate::query::{Filter, Pagination, QueryBuilder, QueryDescriptor, Sort, SortDir};
    pub use crate::schema::{Capability, Catalog, Relation, TableSchema};
    pub use crate::summary::{summarize, Summary, Tally};
}
