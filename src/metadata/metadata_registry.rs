use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::ConfigurationError, metadata::{EntityMeta, KeyRef, MetadataProvider}};

static MEMBER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid member regex")
});

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#{0,2}[A-Za-z_][A-Za-z0-9_$#]*(\.[A-Za-z_][A-Za-z0-9_$#]*)?$").expect("valid table regex")
});

/// In-memory metadata store, filled by code or from a JSON document.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entities: IndexMap<String, EntityMeta>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self { entities: IndexMap::new() }
    }

    pub fn register(&mut self, entity: EntityMeta) -> Result<(), ConfigurationError> {
        Self::check_identifiers(&entity)?;
        for nav in entity.navigations.values() {
            let balanced = nav.foreign_key.as_ref().map(|fk| fk.is_balanced()).unwrap_or(true);
            if !balanced {
                return Err(ConfigurationError::ForeignKeyArity {
                    entity: entity.name.clone(),
                    member: nav.member.clone(),
                });
            }
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn with(mut self, entity: EntityMeta) -> Result<Self, ConfigurationError> {
        self.register(entity)?;
        Ok(self)
    }

    pub fn list(&self) -> Vec<String> {
        let mut v: Vec<_> = self.entities.keys().cloned().collect();
        v.sort();
        v
    }

    /// Cross-entity checks: navigation targets exist and key members resolve on both sides.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for entity in self.entities.values() {
            for nav in entity.navigations.values() {
                let target = self.entities.get(&nav.target)
                    .ok_or_else(|| ConfigurationError::UnknownEntity(nav.target.clone()))?;
                let Some(fk) = &nav.foreign_key else { continue };
                for (inner, outer) in fk.pairs() {
                    Self::check_key(entity, inner)?;
                    Self::check_key(target, outer)?;
                }
            }
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        let entities: Vec<EntityMeta> = serde_json::from_str(text)
            .map_err(|e| ConfigurationError::Load(e.to_string()))?;
        let mut registry = Self::new();
        for entity in entities {
            registry.register(entity)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigurationError::Load(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&text)
    }

    fn check_key(entity: &EntityMeta, key: &KeyRef) -> Result<(), ConfigurationError> {
        match key {
            KeyRef::Column(member) if entity.get_column(member).is_none() => Err(ConfigurationError::UnknownMember {
                entity: entity.name.clone(),
                member: member.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check_identifiers(entity: &EntityMeta) -> Result<(), ConfigurationError> {
        if !MEMBER_NAME.is_match(&entity.name) {
            return Err(ConfigurationError::InvalidIdentifier(entity.name.clone()));
        }
        if !TABLE_NAME.is_match(&entity.table) {
            return Err(ConfigurationError::InvalidIdentifier(entity.table.clone()));
        }
        for column in entity.columns.values() {
            if !MEMBER_NAME.is_match(&column.member) {
                return Err(ConfigurationError::InvalidIdentifier(column.member.clone()));
            }
            if !TABLE_NAME.is_match(&column.name) {
                return Err(ConfigurationError::InvalidIdentifier(column.name.clone()));
            }
        }
        for nav in entity.navigations.values() {
            if !MEMBER_NAME.is_match(&nav.member) {
                return Err(ConfigurationError::InvalidIdentifier(nav.member.clone()));
            }
        }
        Ok(())
    }
}

impl MetadataProvider for MetadataRegistry {
    fn entity(&self, name: &str) -> Option<&EntityMeta> {
        self.entities.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMeta, DbType, ForeignKey, NavigationMeta};
    use std::io::Write;

    const DOC: &str = r#"[
        { "name": "Order", "table": "Orders",
          "columns": [ { "member": "Id", "db_type": "Int", "is_key": true, "is_identity": true },
                       { "member": "Total", "db_type": "Decimal" } ],
          "navigations": [ { "member": "Items", "target": "Item", "many": true,
                             "foreign_key": { "inner_keys": ["Id"], "outer_keys": ["OrderId"] } } ] },
        { "name": "Item", "table": "dbo.Items",
          "columns": [ { "member": "Id", "db_type": "Int", "is_key": true },
                       { "member": "OrderId", "db_type": "Int" } ] }
    ]"#;

    #[test]
    fn loads_and_validates_json() {
        let registry = MetadataRegistry::from_json(DOC).unwrap();
        assert_eq!(registry.list(), vec!["Item", "Order"]);
        assert_eq!(registry.entity("Item").unwrap().table, "dbo.Items");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let registry = MetadataRegistry::load_from_file(file.path()).unwrap();
        assert!(registry.entity("Order").is_some());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MetadataRegistry::load_from_file(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }

    #[test]
    fn rejects_bad_identifiers_and_unbalanced_keys() {
        let mut registry = MetadataRegistry::new();
        let bad = EntityMeta::new("Order", "Orders; DROP").column(ColumnMeta::key("Id", DbType::Int));
        assert!(matches!(registry.register(bad), Err(ConfigurationError::InvalidIdentifier(_))));

        let unbalanced = EntityMeta::new("Order", "Orders")
            .column(ColumnMeta::key("Id", DbType::Int))
            .navigation(NavigationMeta::many("Items", "Item", ForeignKey::new(["Id", "Kind"], ["OrderId"])));
        assert!(matches!(registry.register(unbalanced), Err(ConfigurationError::ForeignKeyArity { .. })));
    }

    #[test]
    fn validate_reports_unknown_key_member() {
        let registry = MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::key("Id", DbType::Int))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "Missing"))))
            .unwrap()
            .with(EntityMeta::new("Item", "Items").column(ColumnMeta::key("Id", DbType::Int)))
            .unwrap();
        assert!(matches!(registry.validate(), Err(ConfigurationError::UnknownMember { .. })));
    }
}
