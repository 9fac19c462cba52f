//! Per-table field and filterability metadata.

use std::collections::BTreeSet;

/// Fields of one logical table and which of them the store can filter on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct TableSchema {
    pub name: String,
    pub primary_key: String,
    /// Whether `$filter` on the primary key is accepted by the store.
    pub primary_key_filterable: bool,
    /// Non-key unique field used to fetch one row when the primary key
    /// cannot be filtered.
    pub lookup_key: Option<String>,
    pub fields: BTreeSet<String>,
    pub unfilterable: BTreeSet<String>,
}

impl TableSchema {
    pub fn new(name: &str, primary_key: &str) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            primary_key_filterable: true,
            lookup_key: None,
            fields: BTreeSet::from([primary_key.to_string()]),
            unfilterable: BTreeSet::new(),
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_unfilterable_primary_key(mut self) -> Self {
        self.primary_key_filterable = false;
        self
    }

    pub fn with_lookup_key(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string());
        self.lookup_key = Some(field.into());
        self
    }

    pub fn with_unfilterable(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string());
        self.unfilterable.insert(field.to_string());
        self
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        if !self.has_field(field) || self.unfilterable.contains(field) {
            return false;
        }
        field != self.primary_key || self.primary_key_filterable
    }

    /// The field used to fetch exactly one row by key: the primary key when
    /// the store allows filtering on it, otherwise the lookup key.
    pub fn filter_key(&self) -> Option<&str> {
        if self.primary_key_filterable && self.is_filterable(&self.primary_key) {
            return Some(&self.primary_key);
        }
        self.lookup_key
            .as_deref()
            .filter(|field| self.is_filterable(field))
    }

    /// All fields in a stable order.
    pub fn field_list(&self) -> Vec<String> {
        self.fields.iter().cloned().collect()
    }
}
