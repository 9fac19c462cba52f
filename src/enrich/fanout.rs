//! Bounded, failure-isolated fan-out fetches.
//!
//! The store has no multi-key fetch and no value-in-set predicate, so a
//! client-side join issues one query per distinct key. Concurrency is the
//! only latency lever; it is capped by a semaphore so a large key set never
//! floods the store.
//!
//! Every per-key fetch is isolated. An error, a timeout or an unbuildable
//! query for one key degrades that key to "no related row" and is reported
//! in [`FanOutResult::failures`]; it never fails the other keys or the
//! caller.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::executor::QueryExecutor;
use crate::model::{Entity, KeyValue};
use crate::query::{QueryBuilder, QueryDescriptor, QueryError, QueryResult};
use crate::schema::{Catalog, Hop, Relation};

/// Default number of fetches in flight per fan-out.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Maximum fetches in flight at any instant. Zero is treated as one.
    pub max_concurrency: usize,
    /// Time allowed for a single fetch once it has been issued.
    pub fetch_timeout: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Why a key has no related row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The store answered with an error.
    Remote(String),
    /// The fetch did not answer within the per-fetch timeout.
    Timeout(Duration),
    /// No valid query could be built for the key.
    InvalidQuery(String),
    /// The overall deadline passed before the fetch finished.
    Deadline,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(message) => write!(f, "remote error: {}", message),
            Self::Timeout(after) => write!(f, "timed out after {:?}", after),
            Self::InvalidQuery(message) => write!(f, "invalid query: {}", message),
            Self::Deadline => write!(f, "deadline elapsed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub key: KeyValue,
    pub reason: FailureReason,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanOutResult {
    /// Related row per key. Keys that failed or matched nothing are absent.
    pub found: HashMap<KeyValue, Entity>,
    /// Failed keys, ordered by key.
    pub failures: Vec<FetchFailure>,
    /// Queries actually sent to the store.
    pub issued: usize,
}

impl FanOutResult {
    pub fn get(&self, key: &KeyValue) -> Option<&Entity> {
        self.found.get(key)
    }

    /// True if no key failed. Keys that simply matched nothing still count
    /// as complete.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

type Outcome = Result<Option<Entity>, FailureReason>;

/// Issues one query per key with bounded concurrency.
pub struct FanOutFetcher {
    executor: Arc<dyn QueryExecutor>,
    config: FanOutConfig,
}

impl FanOutFetcher {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: FanOutConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    /// Fetch one row per key, building each query with `build`.
    pub async fn fetch<F>(&self, keys: &BTreeSet<KeyValue>, build: F) -> FanOutResult
    where
        F: Fn(&KeyValue) -> QueryResult<QueryDescriptor>,
    {
        self.fetch_until(keys, build, None).await
    }

    /// Like [`fetch`](Self::fetch), but stop waiting at `deadline`. Rows
    /// fetched before the deadline are kept; unfinished keys are reported
    /// as [`FailureReason::Deadline`].
    pub async fn fetch_until<F>(
        &self,
        keys: &BTreeSet<KeyValue>,
        build: F,
        deadline: Option<Instant>,
    ) -> FanOutResult
    where
        F: Fn(&KeyValue) -> QueryResult<QueryDescriptor>,
    {
        let mut failures = BTreeMap::new();
        let mut queries = Vec::with_capacity(keys.len());
        for key in keys {
            match build(key) {
                Ok(query) => queries.push((key, query)),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "cannot build fan-out query; degrading to no match");
                    failures.insert(key.clone(), FailureReason::InvalidQuery(err.to_string()));
                }
            }
        }

        let semaphore = Semaphore::new(self.config.max_concurrency.max(1));
        let settled: DashMap<KeyValue, Outcome> = DashMap::with_capacity(queries.len());
        let issued = AtomicUsize::new(0);

        let fetches = futures::future::join_all(
            queries
                .iter()
                .map(|(key, query)| self.fetch_one(&semaphore, key, query, &settled, &issued)),
        );

        match deadline {
            Some(deadline) => {
                if tokio::time::timeout_at(deadline, fetches).await.is_err() {
                    tracing::warn!(
                        pending = queries.len() - settled.len(),
                        "fan-out deadline elapsed; unresolved keys degrade to no match"
                    );
                }
            }
            None => {
                fetches.await;
            }
        }

        let mut found = HashMap::new();
        for (key, _) in &queries {
            match settled.remove(*key) {
                Some((key, Ok(Some(entity)))) => {
                    found.insert(key, entity);
                }
                Some((_, Ok(None))) => {}
                Some((key, Err(reason))) => {
                    failures.insert(key, reason);
                }
                None => {
                    failures.insert((*key).clone(), FailureReason::Deadline);
                }
            }
        }

        FanOutResult {
            found,
            failures: failures
                .into_iter()
                .map(|(key, reason)| FetchFailure { key, reason })
                .collect(),
            issued: issued.load(Ordering::SeqCst),
        }
    }

    /// Fetch the related row for each key of `relation`.
    ///
    /// Single-hop relations fetch the target by its lookup key. Relations
    /// routed through an intermediate table fetch the intermediate row by
    /// its lookup key with the intermediate-to-target relation expanded
    /// inline, so each key still costs exactly one round trip.
    pub async fn fetch_relation(
        &self,
        catalog: &Catalog,
        relation: &Relation,
        keys: &BTreeSet<KeyValue>,
        fields: &[String],
        deadline: Option<Instant>,
    ) -> FanOutResult {
        match &relation.via {
            Some(hop) => {
                let mut result = self
                    .fetch_until(keys, |key| hop_query(catalog, hop, key, fields), deadline)
                    .await;
                result.found = result
                    .found
                    .into_iter()
                    .filter_map(|(key, row)| {
                        row.expanded(&hop.relation)
                            .into_iter()
                            .next()
                            .map(|target| (key, target))
                    })
                    .collect();
                result
            }
            None => {
                self.fetch_until(
                    keys,
                    |key| lookup_query(catalog, &relation.target, key, fields),
                    deadline,
                )
                .await
            }
        }
    }

    async fn fetch_one(
        &self,
        semaphore: &Semaphore,
        key: &KeyValue,
        query: &QueryDescriptor,
        settled: &DashMap<KeyValue, Outcome>,
        issued: &AtomicUsize,
    ) {
        // The semaphore is local and never closed.
        let Ok(_permit) = semaphore.acquire().await else {
            return;
        };
        issued.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(key = %key, query = %query, "fan-out fetch");

        let outcome = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.executor.execute(query),
        )
        .await
        {
            Ok(Ok(result)) => Ok(result.data.into_iter().next()),
            Ok(Err(err)) if err.is_timeout() => {
                tracing::warn!(table = query.table(), key = %key, error = %err, "fan-out fetch timed out; degrading to no match");
                Err(FailureReason::Timeout(self.config.fetch_timeout))
            }
            Ok(Err(err)) => {
                tracing::warn!(table = query.table(), key = %key, error = %err, "fan-out fetch failed; degrading to no match");
                Err(FailureReason::Remote(err.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    table = query.table(),
                    key = %key,
                    timeout = ?self.config.fetch_timeout,
                    "fan-out fetch timed out; degrading to no match"
                );
                Err(FailureReason::Timeout(self.config.fetch_timeout))
            }
        };

        settled.insert(key.clone(), outcome);
    }
}

fn filter_key<'c>(catalog: &'c Catalog, table: &str) -> QueryResult<&'c str> {
    let schema = catalog
        .table(table)
        .map_err(|_| QueryError::UnknownTable(table.to_string()))?;
    schema
        .filter_key()
        .ok_or_else(|| QueryError::UnfilterableField {
            table: table.to_string(),
            field: schema.primary_key.clone(),
        })
}

fn lookup_query(
    catalog: &Catalog,
    table: &str,
    key: &KeyValue,
    fields: &[String],
) -> QueryResult<QueryDescriptor> {
    let lookup = filter_key(catalog, table)?;
    let builder = QueryBuilder::new(catalog, table)
        .filter_eq(lookup, key.to_value())
        .top(1);
    if fields.is_empty() {
        builder.build()
    } else {
        builder.select(fields.iter().cloned()).build()
    }
}

fn hop_query(
    catalog: &Catalog,
    hop: &Hop,
    key: &KeyValue,
    fields: &[String],
) -> QueryResult<QueryDescriptor> {
    let lookup = filter_key(catalog, &hop.table)?;
    let builder = QueryBuilder::new(catalog, hop.table.as_str())
        .filter_eq(lookup, key.to_value())
        .select([lookup])
        .top(1);
    if fields.is_empty() {
        builder.expand(&hop.relation).build()
    } else {
        builder
            .expand_select(&hop.relation, fields.iter().cloned())
            .build()
    }
}
