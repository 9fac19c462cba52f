//! End-to-end enrichment of one page of primary records.
//!
//! ```text
//!   EnrichmentRequest
//!         │
//!         ▼ plan: first Direct relation inline, the rest fan out
//!   primary query ──► executor ──► records (+ inline sub-object)
//!         │
//!         ▼ per fanned relation
//!   collect_keys ──► FanOutFetcher ──► merge_into
//!         │
//!         ▼
//!   EnrichedPage { data, total, warning }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use super::collector::collect_keys;
use super::fanout::{FanOutFetcher, FetchFailure};
use super::merge::merge_into;
use crate::config::Settings;
use crate::error::{EnrichError, EnrichResult};
use crate::executor::{ExecutorError, QueryExecutor};
use crate::model::{EnrichedEntity, Entity};
use crate::query::{Filter, Pagination, QueryBuilder, QueryDescriptor, QueryError, Sort};
use crate::schema::{Catalog, Relation};
use crate::summary::{self, Summary};

/// One relation to resolve for every primary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    /// Relation name on the primary table.
    pub relation: String,
    /// Name of the sub-object attached to each record.
    pub alias: String,
    /// Fields to keep from the related row. Empty keeps every field of the
    /// target table.
    pub fields: Vec<String>,
}

impl RelationSpec {
    pub fn new(relation: &str) -> Self {
        Self {
            relation: relation.to_string(),
            alias: relation.to_string(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A page request against one primary table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    pub table: String,
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub pagination: Option<Pagination>,
    pub relations: Vec<RelationSpec>,
}

impl EnrichmentRequest {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            sort: None,
            pagination: None,
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn page(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    #[must_use]
    pub fn relation(mut self, spec: RelationSpec) -> Self {
        self.relations.push(spec);
        self
    }
}

/// Keys that could not be resolved, grouped by relation alias.
///
/// Not an error: the page is still complete, with null sub-objects for the
/// listed keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialEnrichmentWarning {
    pub failures: BTreeMap<String, Vec<FetchFailure>>,
}

impl PartialEnrichmentWarning {
    pub fn is_empty(&self) -> bool {
        self.failures.values().all(Vec::is_empty)
    }

    /// Failed keys across all relations.
    pub fn failed_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    pub fn failed_for(&self, alias: &str) -> usize {
        self.failures.get(alias).map_or(0, Vec::len)
    }

    pub fn degraded_relations(&self) -> impl Iterator<Item = &str> {
        self.failures
            .iter()
            .filter(|(_, failures)| !failures.is_empty())
            .map(|(alias, _)| alias.as_str())
    }
}

/// One enriched page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedPage {
    pub data: Vec<EnrichedEntity>,
    /// Rows in `data`. The store reports no overall count.
    pub total: usize,
    #[serde(skip)]
    pub warning: Option<PartialEnrichmentWarning>,
    /// Fan-out queries issued while building the page.
    #[serde(skip)]
    pub fanout_queries: usize,
}

impl EnrichedPage {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone)]
struct PlannedRelation {
    relation: Relation,
    alias: String,
    fields: Vec<String>,
}

#[derive(Debug, Default)]
struct Plan {
    inline: Option<PlannedRelation>,
    fanned: Vec<PlannedRelation>,
}

/// Runs primary queries and resolves their relations.
pub struct EnrichmentPipeline {
    catalog: Arc<Catalog>,
    executor: Arc<dyn QueryExecutor>,
    settings: Settings,
}

impl EnrichmentPipeline {
    pub fn new(catalog: Arc<Catalog>, executor: Arc<dyn QueryExecutor>, settings: Settings) -> Self {
        Self {
            catalog,
            executor,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch one page of `request.table` and resolve every requested
    /// relation.
    ///
    /// Fails only if the request is invalid or the primary query fails.
    /// Related rows that cannot be fetched become null sub-objects and are
    /// listed in the page's warning. The output has one row per primary
    /// record, in the store's order.
    pub async fn run(&self, request: &EnrichmentRequest) -> EnrichResult<EnrichedPage> {
        let deadline = self.settings.fanout.deadline().map(|d| Instant::now() + d);
        let plan = self.plan(request)?;

        let query = self.primary_query(request, plan.inline.as_ref())?;
        let records = self.execute_primary(&query).await?;

        let mut rows: Vec<EnrichedEntity> = match &plan.inline {
            Some(inline) => records.into_iter().map(|r| unpack_inline(r, inline)).collect(),
            None => records.into_iter().map(EnrichedEntity::new).collect(),
        };

        let fetcher = FanOutFetcher::new(self.executor.clone(), self.settings.fanout.to_config());
        let mut warning = PartialEnrichmentWarning::default();
        let mut fanout_queries = 0;

        for planned in &plan.fanned {
            let foreign_key = planned.relation.foreign_key.as_str();
            let keys = collect_keys(rows.iter().map(|row| &row.record), foreign_key);
            tracing::debug!(
                relation = %planned.relation.name,
                rows = rows.len(),
                keys = keys.len(),
                "fanning out"
            );

            let result = fetcher
                .fetch_relation(&self.catalog, &planned.relation, &keys, &planned.fields, deadline)
                .await;
            fanout_queries += result.issued;
            rows = merge_into(rows, foreign_key, &planned.alias, &planned.fields, &result.found);

            if !result.failures.is_empty() {
                warning.failures.insert(planned.alias.clone(), result.failures);
            }
        }

        let total = rows.len();
        Ok(EnrichedPage {
            data: rows,
            total,
            warning: (!warning.is_empty()).then_some(warning),
            fanout_queries,
        })
    }

    /// Fetch up to `paging.summary_top` rows of `table` and bucket them.
    pub async fn summarize<K, F>(
        &self,
        table: &str,
        filters: Vec<Filter>,
        classify: F,
    ) -> EnrichResult<Summary<K>>
    where
        K: Ord,
        F: Fn(&Entity) -> Option<K>,
    {
        let records = self.fetch_all(table, filters).await?;
        Ok(summary::summarize(&records, classify))
    }

    /// Fetch up to `paging.summary_top` unenriched rows of `table`.
    pub async fn fetch_all(&self, table: &str, filters: Vec<Filter>) -> EnrichResult<Vec<Entity>> {
        let query = QueryBuilder::new(&self.catalog, table)
            .filters(filters)
            .top(self.settings.paging.summary_top)
            .build()?;
        self.execute_primary(&query).await
    }

    fn plan(&self, request: &EnrichmentRequest) -> EnrichResult<Plan> {
        let mut plan = Plan::default();
        let mut aliases = BTreeSet::new();
        let primary = self
            .catalog
            .table(&request.table)
            .map_err(|_| QueryError::UnknownTable(request.table.clone()))?;

        for spec in &request.relations {
            if !aliases.insert(spec.alias.as_str()) {
                return Err(EnrichError::DuplicateAlias(spec.alias.clone()));
            }
            if primary.has_field(&spec.alias) {
                return Err(EnrichError::AliasShadowsField {
                    alias: spec.alias.clone(),
                    table: request.table.clone(),
                });
            }

            let relation = self.catalog.relation(&request.table, &spec.relation)?.clone();
            let target = self.catalog.table(&relation.target)?;
            let fields = if spec.fields.is_empty() {
                target.field_list()
            } else {
                // Checked for fanned relations too, before any key is fetched.
                if let Some(field) = spec.fields.iter().find(|f| !target.has_field(f)) {
                    return Err(QueryError::UnknownField {
                        table: target.name.clone(),
                        field: field.clone(),
                    }
                    .into());
                }
                spec.fields.clone()
            };
            let planned = PlannedRelation {
                relation,
                alias: spec.alias.clone(),
                fields,
            };

            // One inline expansion per query; any further direct relation
            // is fetched like a client-side join.
            if planned.relation.is_direct() && plan.inline.is_none() {
                plan.inline = Some(planned);
            } else {
                plan.fanned.push(planned);
            }
        }

        Ok(plan)
    }

    fn primary_query(
        &self,
        request: &EnrichmentRequest,
        inline: Option<&PlannedRelation>,
    ) -> EnrichResult<QueryDescriptor> {
        let mut builder = QueryBuilder::new(&self.catalog, request.table.as_str())
            .filters(request.filters.iter().cloned())
            .sort(request.sort.clone())
            .page(self.settings.paging.clamp(request.pagination));
        if let Some(inline) = inline {
            builder = builder.expand_select(&inline.relation.name, inline.fields.iter().cloned());
        }
        Ok(builder.build()?)
    }

    async fn execute_primary(&self, query: &QueryDescriptor) -> EnrichResult<Vec<Entity>> {
        tracing::debug!(query = %query, "primary query");
        let timeout = self.settings.fanout.fetch_timeout();

        let result = match tokio::time::timeout(timeout, self.executor.execute(query)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::Timeout(timeout)),
        };

        match result {
            Ok(result) => Ok(result.data),
            Err(err) => {
                tracing::warn!(table = query.table(), error = %err, "primary query failed");
                Err(EnrichError::RemoteFetch(err))
            }
        }
    }
}

/// Move an inline-expanded relation out of the record into its sub-object.
fn unpack_inline(record: Entity, inline: &PlannedRelation) -> EnrichedEntity {
    let navigation = inline.relation.name.as_str();
    let related = record.expanded(navigation).into_iter().next();
    let base = record.without(navigation);

    match related {
        Some(related) => EnrichedEntity::new(base).with_relation(
            &inline.alias,
            related.project(&inline.fields),
            true,
        ),
        None => EnrichedEntity::new(base).with_relation(
            &inline.alias,
            Entity::nulls(&inline.fields),
            false,
        ),
    }
}
