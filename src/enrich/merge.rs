//! Positional merge of fetched related rows into primary records.

use std::collections::HashMap;

use crate::model::{EnrichedEntity, Entity, KeyValue};

/// Attach the related row for each record under `alias`.
///
/// The output has the same length and order as `records`. A record whose
/// foreign key is null or has no entry in `found` gets a sub-object with
/// every requested field set to null and is marked unresolved. Inputs are
/// not modified, so merging the same fetch result twice yields equal
/// output.
pub fn merge(
    records: &[Entity],
    foreign_key: &str,
    alias: &str,
    fields: &[String],
    found: &HashMap<KeyValue, Entity>,
) -> Vec<EnrichedEntity> {
    let rows = records.iter().cloned().map(EnrichedEntity::new).collect();
    merge_into(rows, foreign_key, alias, fields, found)
}

/// Like [`merge`], for rows that already carry other relations.
pub fn merge_into(
    rows: Vec<EnrichedEntity>,
    foreign_key: &str,
    alias: &str,
    fields: &[String],
    found: &HashMap<KeyValue, Entity>,
) -> Vec<EnrichedEntity> {
    rows.into_iter()
        .map(|row| {
            let (related, resolved) = resolve(&row.record, foreign_key, fields, found);
            row.with_relation(alias, related, resolved)
        })
        .collect()
}

/// The projected related row for one record, and whether it matched.
///
/// Matched and unmatched rows carry exactly `fields`; pass the target
/// table's field list to keep every field.
pub fn resolve(
    record: &Entity,
    foreign_key: &str,
    fields: &[String],
    found: &HashMap<KeyValue, Entity>,
) -> (Entity, bool) {
    match record.key_value(foreign_key).and_then(|key| found.get(&key)) {
        Some(related) => (related.project(fields), true),
        None => (Entity::nulls(fields), false),
    }
}
