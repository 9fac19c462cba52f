//! Declarative query descriptors.
//!
//! A [`QueryDescriptor`] says what to fetch from one table, independent of
//! how it is executed. Descriptors are only produced by
//! [`QueryBuilder`](super::QueryBuilder), which guarantees that any
//! expansion is a direct (single-hop) relation and every filtered field is
//! filterable.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter predicate operator. The store has no value-in-set predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Contains,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "eq"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// A `(field, op, value)` predicate. Predicates are ANDed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Contains,
            value: Value::from(value),
        }
    }

    fn render(&self) -> String {
        match self.op {
            FilterOp::Eq => format!("{} eq {}", self.field, render_literal(&self.value)),
            FilterOp::Contains => {
                format!("contains({},{})", self.field, render_literal(&self.value))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub dir: SortDir,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub top: u32,
    pub skip: u32,
}

impl Pagination {
    pub const fn new(top: u32, skip: u32) -> Self {
        Self { top, skip }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { top: 50, skip: 0 }
    }
}

/// An inline expansion of a direct relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub(crate) relation: String,
    pub(crate) target: String,
    pub(crate) projection: Option<Vec<String>>,
}

impl Expansion {
    /// Navigation name; expanded rows come back under this field.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }
}

/// A validated query against one logical table.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub(crate) table: String,
    pub(crate) filters: Vec<Filter>,
    pub(crate) projection: Option<Vec<String>>,
    pub(crate) expand: Option<Expansion>,
    pub(crate) top: u32,
    pub(crate) skip: u32,
    pub(crate) sort: Option<Sort>,
}

impl QueryDescriptor {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    pub fn expand(&self) -> Option<&Expansion> {
        self.expand.as_ref()
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Render the OData request path, e.g.
    /// `SmartList?$filter=status eq 'Open'&$top=50&$skip=0`.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();

        if !self.filters.is_empty() {
            let clauses: Vec<String> = self.filters.iter().map(Filter::render).collect();
            params.push(format!("$filter={}", clauses.join(" and ")));
        }
        if let Some(fields) = &self.projection {
            params.push(format!("$select={}", fields.join(",")));
        }
        if let Some(expansion) = &self.expand {
            match &expansion.projection {
                Some(fields) => params.push(format!(
                    "$expand={}($select={})",
                    expansion.relation,
                    fields.join(",")
                )),
                None => params.push(format!("$expand={}", expansion.relation)),
            }
        }
        if let Some(sort) = &self.sort {
            let dir = match sort.dir {
                SortDir::Asc => "asc",
                SortDir::Desc => "desc",
            };
            params.push(format!("$orderby={} {}", sort.field, dir));
        }
        params.push(format!("$top={}", self.top));
        params.push(format!("$skip={}", self.skip));

        format!("{}?{}", self.table, params.join("&"))
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
