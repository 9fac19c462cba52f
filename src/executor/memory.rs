//! In-process executor.
//!
//! Evaluates descriptors against tables held in memory with the same
//! semantics as the remote store: `eq`/`contains` filters, ordering, paging,
//! a single level of inline expansion and `$select` projection. Faults and
//! latency can be injected per table to simulate a slow or failing store.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{ExecutorError, ExecutorResult};
use super::{QueryExecutor, ResultSet};
use crate::model::Entity;
use crate::query::{Expansion, Filter, FilterOp, QueryDescriptor, SortDir};
use crate::schema::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultKind {
    /// Answer with an error response.
    Error,
    /// Never answer.
    Stall,
}

#[derive(Debug, Clone)]
struct Fault {
    table: String,
    field: String,
    value: Value,
    kind: FaultKind,
}

/// A [`QueryExecutor`] over in-memory tables.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use joinery::executor::MemoryExecutor;
/// use joinery::model::Entity;
/// use joinery::schema::Catalog;
///
/// let catalog = Arc::new(Catalog::dashboard().unwrap());
/// let executor = MemoryExecutor::new(catalog)
///     .with_rows("Projects", vec![Entity::new().with("id", "P1").with("name", "Alpha")]);
/// assert_eq!(executor.row_count("Projects"), 1);
/// ```
#[derive(Debug)]
pub struct MemoryExecutor {
    catalog: Arc<Catalog>,
    tables: HashMap<String, Vec<Entity>>,
    latency: HashMap<String, Duration>,
    faults: Vec<Fault>,
    calls: AtomicUsize,
}

impl MemoryExecutor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            tables: HashMap::new(),
            latency: HashMap::new(),
            faults: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_rows(mut self, table: &str, rows: Vec<Entity>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    /// Delay every query against `table`.
    #[must_use]
    pub fn with_latency(mut self, table: &str, latency: Duration) -> Self {
        self.latency.insert(table.to_string(), latency);
        self
    }

    /// Fail any query on `table` that filters `field eq value`.
    #[must_use]
    pub fn fail_on(self, table: &str, field: &str, value: impl Into<Value>) -> Self {
        self.with_fault(table, field, value.into(), FaultKind::Error)
    }

    /// Never answer any query on `table` that filters `field eq value`.
    #[must_use]
    pub fn stall_on(self, table: &str, field: &str, value: impl Into<Value>) -> Self {
        self.with_fault(table, field, value.into(), FaultKind::Stall)
    }

    fn with_fault(mut self, table: &str, field: &str, value: Value, kind: FaultKind) -> Self {
        self.faults.push(Fault {
            table: table.into(),
            field: field.into(),
            value,
            kind,
        });
        self
    }

    /// Number of queries received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    fn fault_for(&self, query: &QueryDescriptor) -> Option<FaultKind> {
        self.faults
            .iter()
            .find(|fault| {
                fault.table == query.table()
                    && query.filters().iter().any(|f| {
                        f.op == FilterOp::Eq
                            && f.field == fault.field
                            && values_equal(Some(&f.value), &fault.value)
                    })
            })
            .map(|fault| fault.kind)
    }

    /// Evaluate a descriptor synchronously.
    pub fn evaluate(&self, query: &QueryDescriptor) -> ExecutorResult<Vec<Entity>> {
        let rows = self.tables.get(query.table()).map_or(&[][..], Vec::as_slice);

        let mut matched: Vec<&Entity> = rows
            .iter()
            .filter(|row| query.filters().iter().all(|f| matches_filter(row, f)))
            .collect();

        if let Some(sort) = query.sort() {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.dir {
                    SortDir::Asc => ord,
                    SortDir::Desc => ord.reverse(),
                }
            });
        }

        matched
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.top() as usize)
            .map(|row| self.shape_row(query, row))
            .collect()
    }

    fn shape_row(&self, query: &QueryDescriptor, row: &Entity) -> ExecutorResult<Entity> {
        let mut shaped = match query.projection() {
            Some(fields) => row.project(fields),
            None => row.clone(),
        };
        if let Some(expansion) = query.expand() {
            let related = self.expand_row(query.table(), expansion, row)?;
            shaped.set(expansion.relation(), Value::Array(related));
        }
        Ok(shaped)
    }

    fn expand_row(
        &self,
        table: &str,
        expansion: &Expansion,
        row: &Entity,
    ) -> ExecutorResult<Vec<Value>> {
        let relation = self
            .catalog
            .relation(table, expansion.relation())
            .map_err(|e| ExecutorError::remote("UNKNOWN_RELATION", e.to_string()))?;
        let target = self
            .catalog
            .table(&relation.target)
            .map_err(|e| ExecutorError::remote("UNKNOWN_TABLE", e.to_string()))?;

        let key = match row.get(&relation.foreign_key) {
            Some(value) if !value.is_null() => value,
            _ => return Ok(Vec::new()),
        };

        let related = self
            .tables
            .get(&relation.target)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .filter(|candidate| values_equal(candidate.get(&target.primary_key), key))
            .map(|candidate| match expansion.projection() {
                Some(fields) => candidate.project(fields).into_json(),
                None => candidate.clone().into_json(),
            })
            .collect();
        Ok(related)
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, query: &QueryDescriptor) -> ExecutorResult<ResultSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency.get(query.table()) {
            tokio::time::sleep(*latency).await;
        }

        match self.fault_for(query) {
            Some(FaultKind::Error) => {
                return Err(ExecutorError::remote(
                    "SIMULATED",
                    format!("simulated failure for {}", query),
                ))
            }
            Some(FaultKind::Stall) => std::future::pending::<()>().await,
            None => {}
        }

        self.evaluate(query).map(ResultSet::new)
    }
}

fn matches_filter(row: &Entity, filter: &Filter) -> bool {
    match filter.op {
        FilterOp::Eq => values_equal(row.get(&filter.field), &filter.value),
        FilterOp::Contains => match (row.get_str(&filter.field), filter.value.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
    }
}

/// Missing fields compare equal to null; numbers compare by value.
fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    let actual = actual.unwrap_or(&Value::Null);
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Nulls first, then booleans, numbers and strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
