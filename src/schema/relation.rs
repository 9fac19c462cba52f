//! Relations and the relation constraint table.
//!
//! The remote store expands exactly one level of relation inline. Nested
//! expansions are not rejected by the store; they are silently dropped, so
//! a response cannot tell "unsupported" apart from "no related rows". The
//! table below is therefore the only authority on which joins the store
//! performs and which must be resolved client-side.

use std::collections::BTreeMap;
use std::fmt;

use super::error::{SchemaError, SchemaResult};

/// How a relation can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The store can expand it inline in a single query.
    Direct,
    /// Must be resolved by collecting keys, fanning out and merging.
    ClientJoin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "DIRECT"),
            Self::ClientJoin => write!(f, "CLIENT_JOIN"),
        }
    }
}

/// The intermediate step of a two-hop relation.
///
/// The source's foreign key identifies a row of `table`; `relation` is the
/// `Direct` relation from `table` to the final target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub table: String,
    pub relation: String,
}

/// A directed foreign-key edge `(source, foreign_key) -> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct Relation {
    /// Navigation name, unique per source table.
    pub name: String,
    pub source: String,
    /// Field on `source` holding the key of the related row.
    pub foreign_key: String,
    pub target: String,
    pub capability: Capability,
    /// Intermediate table for relations that span two hops.
    pub via: Option<Hop>,
}

impl Relation {
    pub fn direct(source: &str, name: &str, foreign_key: &str, target: &str) -> Self {
        Self::new(source, name, foreign_key, target, Capability::Direct)
    }

    pub fn client_join(source: &str, name: &str, foreign_key: &str, target: &str) -> Self {
        Self::new(source, name, foreign_key, target, Capability::ClientJoin)
    }

    fn new(
        source: &str,
        name: &str,
        foreign_key: &str,
        target: &str,
        capability: Capability,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            foreign_key: foreign_key.into(),
            target: target.into(),
            capability,
            via: None,
        }
    }

    /// Route this relation through an intermediate table. `relation` names
    /// the relation from `table` to this relation's target.
    pub fn through(mut self, table: &str, relation: &str) -> Self {
        self.via = Some(Hop {
            table: table.into(),
            relation: relation.into(),
        });
        self
    }

    pub fn is_direct(&self) -> bool {
        self.capability == Capability::Direct
    }

    /// Table whose rows are fetched when fanning out over this relation.
    pub fn fetch_table(&self) -> &str {
        self.via.as_ref().map_or(&self.target, |hop| &hop.table)
    }
}

/// Static lookup of every relation the system uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationTable {
    relations: BTreeMap<(String, String), Relation>,
}

impl RelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: Relation) -> SchemaResult<()> {
        let key = (relation.source.clone(), relation.name.clone());
        if self.relations.contains_key(&key) {
            return Err(SchemaError::DuplicateRelation {
                table: relation.source,
                relation: relation.name,
            });
        }
        self.relations.insert(key, relation);
        Ok(())
    }

    pub fn relation(&self, table: &str, name: &str) -> SchemaResult<&Relation> {
        self.relations
            .get(&(table.to_string(), name.to_string()))
            .ok_or_else(|| SchemaError::unknown_relation(table, name))
    }

    /// Capability of a relation. Unknown relations are an error, never a
    /// default.
    pub fn capability(&self, table: &str, name: &str) -> SchemaResult<Capability> {
        self.relation(table, name).map(|r| r.capability)
    }

    pub fn relations_from<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.values().filter(move |r| r.source == table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl TryFrom<Vec<Relation>> for RelationTable {
    type Error = SchemaError;

    fn try_from(relations: Vec<Relation>) -> SchemaResult<Self> {
        let mut table = Self::new();
        for relation in relations {
            table.insert(relation)?;
        }
        Ok(table)
    }
}
