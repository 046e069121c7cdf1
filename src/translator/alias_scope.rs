use indexmap::IndexMap;
use tracing::trace;

use crate::error::ConfigurationError;

/// A labelled source visible in one nesting level.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBinding {
    pub alias: String,
    /// Entity whose members the source exposes, when known.
    pub entity: Option<String>,
    /// Column aliases of a derived table; its members are addressed by these names.
    pub derived_columns: Option<Vec<String>>,
}

impl SourceBinding {
    pub fn is_derived(&self) -> bool {
        self.derived_columns.is_some()
    }
}

/// Table aliases of one nesting level: `t0`, `t1`, ... Explicit sources are bound first,
/// navigation joins take the following numbers as they are discovered.
#[derive(Debug, Clone)]
pub struct AliasScope {
    prefix: String,
    next: usize,
    sources: IndexMap<String, SourceBinding>,
    navigations: IndexMap<String, String>,
}

impl Default for AliasScope {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasScope {
    pub fn new() -> Self {
        Self::with_prefix("t")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self { prefix: prefix.to_string(), next: 0, sources: IndexMap::new(), navigations: IndexMap::new() }
    }

    /// Fresh scope for a predicate subquery nested inside this one.
    pub fn child(&self) -> Self {
        Self::with_prefix(&format!("{}s", self.prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn next_alias(&mut self) -> String {
        let alias = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        alias
    }

    fn ensure_free(&self, key: &str) -> Result<(), ConfigurationError> {
        if self.sources.contains_key(key) || self.navigations.contains_key(key) {
            return Err(ConfigurationError::AliasCollision(key.to_string()));
        }
        Ok(())
    }

    /// Allocates the next alias for a navigation path key.
    pub fn allocate(&mut self, key: &str) -> Result<String, ConfigurationError> {
        self.ensure_free(key)?;
        let alias = self.next_alias();
        trace!(target: "ormql::alias", key, alias = %alias, "allocated");
        self.navigations.insert(key.to_string(), alias.clone());
        Ok(alias)
    }

    /// Binds an explicit source label to the next alias.
    pub fn bind_source(
        &mut self,
        label: &str,
        entity: Option<&str>,
        derived_columns: Option<Vec<String>>,
    ) -> Result<String, ConfigurationError> {
        self.ensure_free(label)?;
        let alias = self.next_alias();
        trace!(target: "ormql::alias", label, alias = %alias, "bound source");
        self.sources.insert(label.to_string(), SourceBinding {
            alias: alias.clone(),
            entity: entity.map(str::to_string),
            derived_columns,
        });
        Ok(alias)
    }

    /// Base alias of this level (`t0`), kept out of later allocations.
    pub fn reserve_base_alias(&mut self) -> String {
        if self.next == 0 {
            self.next = 1;
        }
        format!("{}0", self.prefix)
    }

    /// Binds a source to the reserved base alias, e.g. a wrapped to-many subquery.
    pub fn bind_base(
        &mut self,
        label: &str,
        entity: Option<&str>,
        derived_columns: Option<Vec<String>>,
    ) -> Result<String, ConfigurationError> {
        self.ensure_free(label)?;
        let base = format!("{}0", self.prefix);
        if self.sources.values().any(|s| s.alias == base) || self.navigations.values().any(|a| *a == base) {
            return Err(ConfigurationError::AliasCollision(base));
        }
        let alias = self.reserve_base_alias();
        self.sources.insert(label.to_string(), SourceBinding {
            alias: alias.clone(),
            entity: entity.map(str::to_string),
            derived_columns,
        });
        Ok(alias)
    }

    /// Alias of a source label or navigation key.
    pub fn resolve(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.sources.get(key).map(|s| s.alias.as_str())
            .or_else(|| self.navigations.get(key).map(String::as_str))
            .ok_or_else(|| ConfigurationError::UnresolvedAlias(key.to_string()))
    }

    pub fn source(&self, label: &str) -> Result<&SourceBinding, ConfigurationError> {
        self.sources.get(label).ok_or_else(|| ConfigurationError::UnresolvedAlias(label.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sources.contains_key(key) || self.navigations.contains_key(key)
    }

    /// Every alias handed out, sources first.
    pub fn aliases(&self) -> Vec<&str> {
        self.sources.values().map(|s| s.alias.as_str())
            .chain(self.navigations.values().map(String::as_str))
            .collect()
    }
}
