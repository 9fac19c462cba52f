//! Request-scoped data model.
//!
//! Nothing here is cached or persisted. Entities are never mutated after
//! they are fetched; every transformation produces a new value.

mod enriched;
mod entity;

pub use enriched::EnrichedEntity;
pub use entity::{Entity, KeyValue};
