//! Catalog: tables plus relations, validated together.

use std::collections::BTreeMap;

use super::error::{SchemaError, SchemaResult};
use super::relation::{Capability, Relation, RelationTable};
use super::table::TableSchema;

/// The single source of truth for what the remote store can express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tables: BTreeMap<String, TableSchema>,
    relations: RelationTable,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(tables: Vec<TableSchema>, relations: Vec<Relation>) -> SchemaResult<Self> {
        let mut by_name = BTreeMap::new();
        for table in tables {
            if by_name.contains_key(&table.name) {
                return Err(SchemaError::DuplicateTable(table.name));
            }
            by_name.insert(table.name.clone(), table);
        }

        let catalog = Self {
            tables: by_name,
            relations: RelationTable::try_from(relations)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn table(&self, name: &str) -> SchemaResult<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    pub fn relation(&self, table: &str, name: &str) -> SchemaResult<&Relation> {
        self.relations.relation(table, name)
    }

    pub fn capability(&self, table: &str, name: &str) -> SchemaResult<Capability> {
        self.relations.capability(table, name)
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    fn validate(&self) -> SchemaResult<()> {
        for relation in self.relations.iter() {
            let source = self.table(&relation.source)?;
            self.table(&relation.target)?;
            if !source.has_field(&relation.foreign_key) {
                return Err(SchemaError::unknown_field(
                    &relation.source,
                    &relation.foreign_key,
                ));
            }

            match &relation.via {
                Some(hop) => {
                    let invalid = |reason: String| SchemaError::InvalidHop {
                        table: relation.source.clone(),
                        relation: relation.name.clone(),
                        reason,
                    };

                    if relation.is_direct() {
                        return Err(invalid("a direct relation cannot have a hop".into()));
                    }
                    let intermediate = self.table(&hop.table)?;
                    if intermediate.filter_key().is_none() {
                        return Err(SchemaError::NoLookupKey(hop.table.clone()));
                    }
                    let inner = self.relations.relation(&hop.table, &hop.relation)?;
                    if !inner.is_direct() {
                        return Err(invalid(format!(
                            "{}.{} is not a direct relation",
                            hop.table, hop.relation
                        )));
                    }
                    if inner.target != relation.target {
                        return Err(invalid(format!(
                            "{}.{} leads to {}, not {}",
                            hop.table, hop.relation, inner.target, relation.target
                        )));
                    }
                }
                None if !relation.is_direct() => {
                    if self.table(&relation.target)?.filter_key().is_none() {
                        return Err(SchemaError::NoLookupKey(relation.target.clone()));
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Capability facts of the inspection dashboard store.
    ///
    /// Every table's `id` primary key is rejected by `$filter` with a syntax
    /// error, so each table mirrors it into a filterable `record_id`. Only
    /// single-level expansion works; `SmartList` reaches `Projects` and
    /// `Assets` only through `ProjectAssets`.
    pub fn dashboard() -> SchemaResult<Self> {
        let table = |name: &str, fields: &[&str]| {
            TableSchema::new(name, "id")
                .with_unfilterable_primary_key()
                .with_lookup_key("record_id")
                .with_fields(fields)
        };

        Self::new(
            vec![
                table(
                    "SmartList",
                    &[
                        "project_asset_id",
                        "title",
                        "description",
                        "priority",
                        "status",
                        "due_date",
                        "milestone_target",
                        "system_group",
                        "assigned_to",
                        "created_at",
                        "updated_at",
                    ],
                ),
                table(
                    "ProjectAssets",
                    &[
                        "project_id",
                        "asset_id",
                        "raptor_checklist_completion",
                        "sit_completion",
                        "doc_verification_completion",
                        "checklist_remaining",
                        "checklist_closed",
                        "checklist_non_conforming",
                        "checklist_not_applicable",
                        "checklist_deferred",
                    ],
                ),
                table(
                    "Projects",
                    &[
                        "name",
                        "region",
                        "risk_level",
                        "status",
                        "start_date",
                        "end_date",
                        "created_at",
                        "updated_at",
                    ],
                ),
                table("Assets", &["name", "type", "location"]),
                table(
                    "Issues",
                    &[
                        "issue_id",
                        "project_asset_id",
                        "system",
                        "priority",
                        "short_description",
                        "description",
                        "status",
                        "is_closed",
                        "date_opened",
                        "timestamp_modified",
                    ],
                ),
                table(
                    "IssueNotes",
                    &["issue_id", "note", "creation_timestamp", "created_by"],
                ),
                table(
                    "IssuesSummary",
                    &[
                        "project_asset_id",
                        "summary_date",
                        "total_items",
                        "open_high",
                        "closed_high",
                        "open_medium",
                        "closed_medium",
                        "open_low",
                        "closed_low",
                        "system_group",
                        "system_progress",
                    ],
                ),
            ],
            vec![
                Relation::direct("SmartList", "ProjectAssets", "project_asset_id", "ProjectAssets"),
                Relation::direct("Issues", "ProjectAssets", "project_asset_id", "ProjectAssets"),
                Relation::direct("ProjectAssets", "Projects", "project_id", "Projects"),
                Relation::direct("ProjectAssets", "Assets", "asset_id", "Assets"),
                Relation::client_join("SmartList", "Projects", "project_asset_id", "Projects")
                    .through("ProjectAssets", "Projects"),
                Relation::client_join("SmartList", "Assets", "project_asset_id", "Assets")
                    .through("ProjectAssets", "Assets"),
                Relation::client_join("Issues", "Projects", "project_asset_id", "Projects")
                    .through("ProjectAssets", "Projects"),
                Relation::client_join("Issues", "Assets", "project_asset_id", "Assets")
                    .through("ProjectAssets", "Assets"),
                Relation::client_join("IssueNotes", "Issues", "issue_id", "Issues"),
                Relation::client_join(
                    "IssuesSummary",
                    "ProjectAssets",
                    "project_asset_id",
                    "ProjectAssets",
                ),
            ],
        )
    }
}
