//! Query builder - construct query descriptors with a fluent API.
//!
//! Builder methods only record what was asked for; every check against the
//! catalog happens in [`QueryBuilder::build`], so a builder can be assembled
//! freely and validated once.

use serde_json::Value;

use super::descriptor::{
    Expansion, Filter, FilterOp, Pagination, QueryDescriptor, Sort, SortDir,
};
use super::error::{QueryError, QueryResult};
use crate::schema::{Capability, Catalog, TableSchema};

/// Fluent constructor for [`QueryDescriptor`].
///
/// # Example
///
/// ```
/// use joinery::query::QueryBuilder;
/// use joinery::schema::Catalog;
///
/// let catalog = Catalog::dashboard().unwrap();
/// let query = QueryBuilder::new(&catalog, "SmartList")
///     .filter_eq("status", "Open")
///     .expand_select("ProjectAssets", ["sit_completion"])
///     .top(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     query.to_query_string(),
///     "SmartList?$filter=status eq 'Open'&$expand=ProjectAssets($select=sit_completion)&$top=10&$skip=0"
/// );
/// ```
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct QueryBuilder<'a> {
    catalog: &'a Catalog,
    table: String,
    filters: Vec<Filter>,
    projection: Option<Vec<String>>,
    expansions: Vec<(String, Option<Vec<String>>)>,
    pagination: Pagination,
    sort: Option<Sort>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(catalog: &'a Catalog, table: impl Into<String>) -> Self {
        Self {
            catalog,
            table: table.into(),
            filters: Vec::new(),
            projection: None,
            expansions: Vec::new(),
            pagination: Pagination::default(),
            sort: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters<I: IntoIterator<Item = Filter>>(mut self, filters: I) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn filter_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn filter_contains(self, field: &str, value: &str) -> Self {
        self.filter(Filter::contains(field, value))
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Expand a direct relation inline with all of its fields.
    pub fn expand(mut self, relation: &str) -> Self {
        self.expansions.push((relation.to_string(), None));
        self
    }

    /// Expand a direct relation inline, returning only `fields`.
    pub fn expand_select<I, S>(mut self, relation: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expansions.push((
            relation.to_string(),
            Some(fields.into_iter().map(Into::into).collect()),
        ));
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.pagination.top = top;
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.pagination.skip = skip;
        self
    }

    pub fn page(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn order_by(mut self, field: &str, dir: SortDir) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            dir,
        });
        self
    }

    pub fn sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    /// Validate against the catalog and produce the descriptor.
    pub fn build(self) -> QueryResult<QueryDescriptor> {
        let schema = self
            .catalog
            .table(&self.table)
            .map_err(|_| QueryError::UnknownTable(self.table.clone()))?;

        if self.pagination.top == 0 {
            return Err(QueryError::EmptyPage {
                table: self.table.clone(),
            });
        }

        for filter in &self.filters {
            check_filter(schema, filter)?;
        }
        if let Some(fields) = &self.projection {
            check_projection(schema, fields)?;
        }
        if let Some(sort) = &self.sort {
            check_fields(schema, std::slice::from_ref(&sort.field))?;
        }

        let expand = match self.expansions.as_slice() {
            [] => None,
            [(relation, projection)] => Some(self.check_expansion(relation, projection)?),
            _ => {
                return Err(QueryError::MultipleExpansions {
                    table: self.table.clone(),
                })
            }
        };

        Ok(QueryDescriptor {
            table: self.table,
            filters: self.filters,
            projection: self.projection,
            expand,
            top: self.pagination.top,
            skip: self.pagination.skip,
            sort: self.sort,
        })
    }

    fn check_expansion(
        &self,
        relation: &str,
        projection: &Option<Vec<String>>,
    ) -> QueryResult<Expansion> {
        let edge = self
            .catalog
            .relation(&self.table, relation)
            .map_err(|_| QueryError::UnknownRelation {
                table: self.table.clone(),
                relation: relation.to_string(),
            })?;

        if edge.capability != Capability::Direct {
            return Err(QueryError::ClientJoinExpansion {
                table: self.table.clone(),
                relation: relation.to_string(),
            });
        }

        if let Some(fields) = projection {
            let target = self
                .catalog
                .table(&edge.target)
                .map_err(|_| QueryError::UnknownTable(edge.target.clone()))?;
            check_projection(target, fields)?;
        }

        Ok(Expansion {
            relation: edge.name.clone(),
            target: edge.target.clone(),
            projection: projection.clone(),
        })
    }
}

fn check_filter(schema: &TableSchema, filter: &Filter) -> QueryResult<()> {
    if !schema.has_field(&filter.field) {
        return Err(QueryError::UnknownField {
            table: schema.name.clone(),
            field: filter.field.clone(),
        });
    }
    if !schema.is_filterable(&filter.field) {
        return Err(QueryError::UnfilterableField {
            table: schema.name.clone(),
            field: filter.field.clone(),
        });
    }

    match (&filter.op, &filter.value) {
        (_, Value::Array(_) | Value::Object(_)) => Err(QueryError::NonScalarValue {
            field: filter.field.clone(),
        }),
        (FilterOp::Contains, Value::String(s)) if !s.is_empty() => Ok(()),
        (FilterOp::Contains, _) => Err(QueryError::InvalidOperand {
            field: filter.field.clone(),
            op: FilterOp::Contains,
        }),
        (FilterOp::Eq, _) => Ok(()),
    }
}

/// A `$select` must name at least one known field.
fn check_projection(schema: &TableSchema, fields: &[String]) -> QueryResult<()> {
    if fields.is_empty() {
        return Err(QueryError::EmptyProjection {
            table: schema.name.clone(),
        });
    }
    check_fields(schema, fields)
}

fn check_fields(schema: &TableSchema, fields: &[String]) -> QueryResult<()> {
    match fields.iter().find(|f| !schema.has_field(f)) {
        Some(field) => Err(QueryError::UnknownField {
            table: schema.name.clone(),
            field: field.clone(),
        }),
        None => Ok(()),
    }
}
