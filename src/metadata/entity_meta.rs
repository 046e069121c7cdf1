use indexmap::IndexMap;
use serde::Deserialize;

use crate::metadata::{ColumnMeta, NavigationMeta};

#[derive(Debug, Clone, Deserialize)]
struct EntityDef {
    name: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    columns: Vec<ColumnMeta>,
    #[serde(default)]
    navigations: Vec<NavigationMeta>,
}

/// Mapping of one entity type to its table, in member declaration order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "EntityDef")]
pub struct EntityMeta {
    pub name: String,
    pub table: String,
    pub columns: IndexMap<String, ColumnMeta>,
    pub navigations: IndexMap<String, NavigationMeta>,
}

impl From<EntityDef> for EntityMeta {
    fn from(def: EntityDef) -> Self {
        let table = def.table.unwrap_or_else(|| def.name.clone());
        let mut meta = EntityMeta::new(&def.name, &table);
        for column in def.columns {
            meta = meta.column(column);
        }
        for navigation in def.navigations {
            meta = meta.navigation(navigation);
        }
        meta
    }
}

impl EntityMeta {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            columns: IndexMap::new(),
            navigations: IndexMap::new(),
        }
    }

    pub fn column(mut self, mut column: ColumnMeta) -> Self {
        if column.name.is_empty() {
            column.name = column.member.clone();
        }
        self.columns.insert(column.member.clone(), column);
        self
    }

    pub fn navigation(mut self, navigation: NavigationMeta) -> Self {
        self.navigations.insert(navigation.member.clone(), navigation);
        self
    }

    pub fn get_column(&self, member: &str) -> Option<&ColumnMeta> {
        self.columns.get(member)
    }

    pub fn get_navigation(&self, member: &str) -> Option<&NavigationMeta> {
        self.navigations.get(member)
    }

    pub fn mapped_columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.values().filter(|c| c.is_mapped)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.mapped_columns().filter(|c| c.is_key)
    }

    pub fn identity(&self) -> Option<&ColumnMeta> {
        self.mapped_columns().find(|c| c.is_identity)
    }

    /// Number of mapped data columns selected for a whole-entity projection.
    pub fn data_field_count(&self) -> usize {
        self.mapped_columns().count()
    }

    pub fn has_many(&self) -> bool {
        self.navigations.values().any(|n| n.many)
    }
}
