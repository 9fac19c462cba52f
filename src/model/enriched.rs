//! Enriched records: a primary entity plus resolved related sub-objects.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::Entity;

/// A primary entity with zero or more named sub-objects attached.
///
/// Every sub-object has the same field set whether or not its relation
/// resolved; an unresolved relation holds null for each of its fields.
/// `unresolved` records which aliases fell back to nulls so callers can
/// tell a genuine null value from a failed join.
///
/// Serializes flat: the record's own fields followed by one object per
/// alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEntity {
    #[serde(flatten)]
    pub record: Entity,

    #[serde(flatten)]
    pub relations: BTreeMap<String, Entity>,

    #[serde(skip)]
    pub unresolved: BTreeSet<String>,
}

impl EnrichedEntity {
    pub fn new(record: Entity) -> Self {
        Self {
            record,
            relations: BTreeMap::new(),
            unresolved: BTreeSet::new(),
        }
    }

    /// Attach a sub-object under `alias`.
    #[must_use]
    pub fn with_relation(mut self, alias: &str, fields: Entity, resolved: bool) -> Self {
        self.relations.insert(alias.to_string(), fields);
        if resolved {
            self.unresolved.remove(alias);
        } else {
            self.unresolved.insert(alias.to_string());
        }
        self
    }

    pub fn relation(&self, alias: &str) -> Option<&Entity> {
        self.relations.get(alias)
    }

    pub fn is_resolved(&self, alias: &str) -> bool {
        self.relations.contains_key(alias) && !self.unresolved.contains(alias)
    }

    /// Collapse into a single entity with each sub-object nested under its
    /// alias.
    pub fn flatten(&self) -> Entity {
        let mut flat = self.record.clone();
        for (alias, fields) in &self.relations {
            flat.set(alias, fields.clone().into_json());
        }
        flat
    }
}
