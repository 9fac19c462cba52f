//! Dashboard classifiers for SmartList items and issues.

use std::fmt;

use serde::Serialize;

use super::{Summary, Tally};
use crate::model::Entity;

/// SmartList priority. Matched exactly as the store spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn classify(entity: &Entity) -> Option<Self> {
        entity.get_str("priority").and_then(Self::parse)
    }
}

/// SmartList status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ListStatus {
    Open,
    Closed,
    Deferred,
}

impl ListStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Open" => Some(Self::Open),
            "Closed" => Some(Self::Closed),
            "Deferred" => Some(Self::Deferred),
            _ => None,
        }
    }

    pub fn classify(entity: &Entity) -> Option<Self> {
        entity.get_str("status").and_then(Self::parse)
    }
}

/// Status column of the SmartList cross-tab. Deferred items have no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CrossTabStatus {
    Open,
    Closed,
}

impl CrossTabStatus {
    pub fn from_status(status: ListStatus) -> Option<Self> {
        match status {
            ListStatus::Open => Some(Self::Open),
            ListStatus::Closed => Some(Self::Closed),
            ListStatus::Deferred => None,
        }
    }
}

/// Priority × status cell of the SmartList cross-tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SmartListClass {
    pub priority: Priority,
    pub status: CrossTabStatus,
}

impl SmartListClass {
    /// A recognized priority and an Open or Closed status; anything else,
    /// Deferred included, is unclassified.
    pub fn classify(entity: &Entity) -> Option<Self> {
        Some(Self {
            priority: Priority::classify(entity)?,
            status: ListStatus::classify(entity).and_then(CrossTabStatus::from_status)?,
        })
    }
}

/// SmartList counts, each view with its own unclassified count.
///
/// An item with a known status and an unknown priority still counts in
/// `by_status`; it is unclassified only in the views that need priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartListSummary {
    pub by_status: Summary<ListStatus>,
    pub by_priority: Summary<Priority>,
    pub by_priority_and_status: Summary<SmartListClass>,
}

pub fn summarize_smart_list(items: &[Entity]) -> SmartListSummary {
    let mut summary = SmartListSummary::default();
    for item in items {
        summary.by_status.record(ListStatus::classify(item));
        summary.by_priority.record(Priority::classify(item));
        summary
            .by_priority_and_status
            .record(SmartListClass::classify(item));
    }
    summary
}

/// Issue priority, stored as a single letter in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssuePriority {
    H,
    M,
    L,
}

impl IssuePriority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "H" => Some(Self::H),
            "M" => Some(Self::M),
            "L" => Some(Self::L),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueStatus {
    New,
    Assigned,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "NEW" => Some(Self::New),
            "ASSIGNED" => Some(Self::Assigned),
            "RESOLVED" => Some(Self::Resolved),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Assigned => write!(f, "ASSIGNED"),
            Self::Resolved => write!(f, "RESOLVED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueClass {
    pub priority: IssuePriority,
    pub status: IssueStatus,
}

impl IssueClass {
    pub fn classify(issue: &Entity) -> Option<Self> {
        Some(Self {
            priority: issue.get_str("priority").and_then(IssuePriority::parse)?,
            status: issue.get_str("status").and_then(IssueStatus::parse)?,
        })
    }

    /// `is_closed == 1` wins over the status text.
    pub fn is_closed(issue: &Entity) -> bool {
        issue.get_f64("is_closed") == Some(1.0)
            || issue.get_str("status").and_then(IssueStatus::parse) == Some(IssueStatus::Closed)
    }
}

/// Issue cross-tab plus open/closed totals over every scanned issue,
/// classified or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSummary {
    pub by_class: Summary<IssueClass>,
    pub tally: Tally,
}

pub fn summarize_issues(issues: &[Entity]) -> IssueSummary {
    let mut summary = IssueSummary::default();
    for issue in issues {
        summary.tally.record(IssueClass::is_closed(issue));
        summary.by_class.record(IssueClass::classify(issue));
    }
    summary
}
