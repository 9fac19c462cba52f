//! Static knowledge about the remote store.
//!
//! Two kinds of facts live here, both discovered against the live store and
//! captured once:
//!
//! - per-table filterability (which fields `$filter` accepts),
//! - the relation constraint table (which joins the store expands inline
//!   and which must be resolved client-side).
//!
//! The query builder consults a [`Catalog`] before constructing anything,
//! so requests the store cannot express fail fast instead of being sent.

mod catalog;
mod error;
mod relation;
mod table;

pub use catalog::Catalog;
pub use error::{SchemaError, SchemaResult};
pub use relation::{Capability, Hop, Relation, RelationTable};
pub use table::TableSchema;
