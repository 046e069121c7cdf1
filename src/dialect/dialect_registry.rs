use std::{collections::HashMap, sync::Arc};

use crate::{
    dialect::{Dialect, DialectKind, MySql, Oracle, Postgres, SqlServer, Sqlite},
    error::ConfigurationError,
};

/// Case-insensitive registry of dialects, built once at startup and passed around.
#[derive(Default)]
pub struct DialectRegistry {
    by_name: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self { by_name: HashMap::new() }
    }

    pub fn register<D: Dialect + 'static>(&mut self, dialect: D) {
        self.by_name.insert(dialect.name().to_ascii_lowercase(), Arc::new(dialect));
    }

    pub fn alias(&mut self, alias: &str, name: &str) -> Result<(), ConfigurationError> {
        let dialect = self.get(name)?;
        self.by_name.insert(alias.to_ascii_lowercase(), dialect);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>, ConfigurationError> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownDialect(name.to_string()))
    }

    pub fn by_kind(&self, kind: DialectKind) -> Option<Arc<dyn Dialect>> {
        self.by_name.values().find(|d| d.kind() == kind).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let mut v: Vec<_> = self.by_name.keys().cloned().collect();
        v.sort();
        v
    }

    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry.register(SqlServer::new());
        registry.register(MySql::new());
        registry.register(Postgres::new());
        registry.register(Oracle::new());
        registry.register(Sqlite::new());
        registry
    }
}
