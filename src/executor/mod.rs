//! Remote query execution boundary.
//!
//! The remote store is reached through a collaborator that accepts one
//! [`QueryDescriptor`] and answers `{ data, error? }`. The enrichment core
//! only sees the [`QueryExecutor`] trait and assumes nothing about retries;
//! those belong to the collaborator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  EnrichmentPipeline / FanOutFetcher         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ &QueryDescriptor
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     dyn QueryExecutor                       │
//! │   - remote client (supplied by the caller)                  │
//! │   - MemoryExecutor (in-process store, tests and local use)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

pub use error::{ErrorInfo, ExecutorError, ExecutorResult};
pub use memory::MemoryExecutor;

use crate::model::Entity;
use crate::query::QueryDescriptor;

/// Rows returned by one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub data: Vec<Entity>,
}

impl ResultSet {
    pub fn new(data: Vec<Entity>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Response body as the store's client library returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteResponse {
    #[serde(default)]
    pub data: Option<Vec<Entity>>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

impl RemoteResponse {
    pub fn from_json(body: &str) -> ExecutorResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// An error payload wins over any data; a missing `data` is an empty
    /// result.
    pub fn into_result(self) -> ExecutorResult<ResultSet> {
        match self.error {
            Some(info) => Err(info.into()),
            None => Ok(ResultSet::new(self.data.unwrap_or_default())),
        }
    }
}

/// Executes one query descriptor against the remote store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &QueryDescriptor) -> ExecutorResult<ResultSet>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn execute(&self, query: &QueryDescriptor) -> ExecutorResult<ResultSet> {
        (**self).execute(query).await
    }
}
