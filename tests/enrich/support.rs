//! Shared fixtures for the enrichment tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use joinery::executor::{ExecutorResult, MemoryExecutor, QueryExecutor, ResultSet};
use joinery::model::Entity;
use joinery::query::QueryDescriptor;
use joinery::schema::Catalog;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::dashboard().unwrap())
}

/// A row whose primary key is mirrored into the filterable `record_id`.
pub fn row(id: &str) -> Entity {
    Entity::new().with("id", id).with("record_id", id)
}

/// Project assets `PA1`..`PA3` linked to projects `P1`..`P3` and assets
/// `X1`..`X3`.
pub fn dashboard_store(catalog: Arc<Catalog>) -> MemoryExecutor {
    MemoryExecutor::new(catalog)
        .with_rows(
            "ProjectAssets",
            (1..=3)
                .map(|n| {
                    row(&format!("PA{n}"))
                        .with("project_id", format!("P{n}"))
                        .with("asset_id", format!("X{n}"))
                        .with("sit_completion", 10 * n)
                })
                .collect(),
        )
        .with_rows(
            "Projects",
            vec![
                row("P1").with("name", "Alpha").with("region", "North"),
                row("P2").with("name", "Beta").with("region", "South"),
                row("P3").with("name", "Gamma").with("region", "East"),
            ],
        )
        .with_rows(
            "Assets",
            vec![
                row("X1").with("name", "Pump").with("type", "Mechanical"),
                row("X2").with("name", "Valve").with("type", "Mechanical"),
                row("X3").with("name", "Panel").with("type", "Electrical"),
            ],
        )
}

/// Wraps an executor and records what it was asked and how many queries
/// were running at once.
pub struct InstrumentedExecutor {
    inner: MemoryExecutor,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InstrumentedExecutor {
    pub fn new(inner: MemoryExecutor) -> Self {
        Self {
            inner,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Hold every query for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn queries_on(&self, table: &str) -> Vec<String> {
        let prefix = format!("{table}?");
        self.queries()
            .into_iter()
            .filter(|q| q.starts_with(&prefix))
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for InstrumentedExecutor {
    async fn execute(&self, query: &QueryDescriptor) -> ExecutorResult<ResultSet> {
        self.queries.lock().unwrap().push(query.to_query_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.execute(query).await
    }
}
