//! Numeric rollups for the dashboard cards.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Tally;
use crate::model::Entity;

/// Rounded mean completion percentages over a set of project assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionAverages {
    pub total: usize,
    pub raptor: i64,
    pub sit: i64,
    pub doc: i64,
}

/// Missing or null percentages count as zero. An empty input yields zeros.
pub fn completion_averages(assets: &[Entity]) -> CompletionAverages {
    let total = assets.len();
    let mean = |field: &str| {
        let sum: f64 = assets.iter().map(|a| a.get_f64(field).unwrap_or(0.0)).sum();
        round_half_up(sum / total.max(1) as f64)
    };

    CompletionAverages {
        total,
        raptor: mean("raptor_checklist_completion"),
        sit: mean("sit_completion"),
        doc: mean("doc_verification_completion"),
    }
}

/// Highest `system_progress` per `system_group`.
///
/// A missing group is keyed as the empty string and missing progress counts
/// as zero. Groups whose progress never rises above zero have no entry.
pub fn system_progress(rows: &[Entity]) -> BTreeMap<String, f64> {
    let mut progress: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        let value = row.get_f64("system_progress").unwrap_or(0.0);
        let group = row.get_str("system_group").unwrap_or_default();
        if value > progress.get(group).copied().unwrap_or(0.0) {
            progress.insert(group.to_string(), value);
        }
    }
    progress
}

/// Summed open/closed action items per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionItemCounts {
    pub total_items: usize,
    pub high: Tally,
    pub medium: Tally,
    pub low: Tally,
}

pub fn action_item_counts(rows: &[Entity]) -> ActionItemCounts {
    let mut counts = ActionItemCounts::default();
    for row in rows {
        counts.total_items += count(row, "total_items");
        counts
            .high
            .add(count(row, "open_high"), count(row, "closed_high"));
        counts
            .medium
            .add(count(row, "open_medium"), count(row, "closed_medium"));
        counts.low.add(count(row, "open_low"), count(row, "closed_low"));
    }
    counts
}

fn count(row: &Entity, field: &str) -> usize {
    row.get_f64(field).map_or(0, |n| n.max(0.0) as usize)
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
