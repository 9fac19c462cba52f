//! Foreign-key collection.

use std::collections::BTreeSet;

use crate::model::{Entity, KeyValue};

/// Collect the distinct, non-null values of `field` across `records`.
///
/// This bounds fan-out to one remote call per distinct related row rather
/// than one per primary row. Records whose key is null, missing or not a
/// usable key value contribute nothing.
pub fn collect_keys<'a, I>(records: I, field: &str) -> BTreeSet<KeyValue>
where
    I: IntoIterator<Item = &'a Entity>,
{
    records
        .into_iter()
        .filter_map(|record| record.key_value(field))
        .collect()
}
