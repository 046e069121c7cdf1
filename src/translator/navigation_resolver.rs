use indexmap::IndexMap;
use tracing::trace;

use crate::{
    error::{OrmError, TranslationError},
    metadata::{EntityMeta, KeyRef, NavigationMeta},
    translator::{AliasScope, TranslateContext},
};

/// One LEFT JOIN synthesized from a navigation path.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationJoin {
    /// Full path key, e.g. `a.Client.Accounts`.
    pub key: String,
    pub alias: String,
    pub parent_alias: String,
    pub owner_entity: String,
    /// Owner is a derived table whose columns carry member names.
    pub owner_derived: bool,
    pub navigation: NavigationMeta,
    pub predicate: Option<String>,
}

/// Where a resolved navigation chain ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub key: String,
    pub alias: String,
    pub entity: String,
    pub many: bool,
}

/// Collects the navigation joins of one statement level, deduplicated by path key.
#[derive(Debug, Clone, Default)]
pub struct NavigationResolver {
    joins: IndexMap<String, NavigationJoin>,
    has_many: bool,
}

impl NavigationResolver {
    pub fn new() -> Self {
        Self { joins: IndexMap::new(), has_many: false }
    }

    /// Joins `navigation` of the owner bound at `parent_key`, reusing the alias when the
    /// path was already joined.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        scope: &mut AliasScope,
        key: &str,
        parent_alias: &str,
        owner: &EntityMeta,
        owner_derived: bool,
        navigation: &NavigationMeta,
    ) -> Result<NavigationTarget, OrmError> {
        if navigation.foreign_key.is_none() {
            return Err(TranslationError::MissingForeignKey {
                member: format!("{}.{}", owner.name, navigation.member),
            }.into());
        }
        if navigation.many {
            self.has_many = true;
        }
        if let Some(existing) = self.joins.get(key) {
            return Ok(NavigationTarget {
                key: key.to_string(),
                alias: existing.alias.clone(),
                entity: navigation.target.clone(),
                many: navigation.many,
            });
        }
        let alias = scope.allocate(key)?;
        trace!(target: "ormql::navigation", key, alias = %alias, entity = %navigation.target, many = navigation.many, "registered navigation");
        self.joins.insert(key.to_string(), NavigationJoin {
            key: key.to_string(),
            alias: alias.clone(),
            parent_alias: parent_alias.to_string(),
            owner_entity: owner.name.clone(),
            owner_derived,
            navigation: navigation.clone(),
            predicate: None,
        });
        Ok(NavigationTarget { key: key.to_string(), alias, entity: navigation.target.clone(), many: navigation.many })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.joins.contains_key(key)
    }

    /// AND-s a filter into the join condition of `key`.
    pub fn set_predicate(&mut self, key: &str, predicate: String) -> Result<(), OrmError> {
        let join = self.joins.get_mut(key)
            .ok_or_else(|| crate::error::ConfigurationError::UnresolvedAlias(key.to_string()))?;
        join.predicate = Some(match join.predicate.take() {
            Some(existing) => format!("{} AND {}", existing, predicate),
            None => predicate,
        });
        Ok(())
    }

    pub fn has_many(&self) -> bool {
        self.has_many
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn joins(&self) -> impl Iterator<Item = &NavigationJoin> {
        self.joins.values()
    }

    /// Renders the joins in registration order; parents are always registered first.
    pub fn emit(&self, ctx: &TranslateContext) -> Result<Vec<String>, OrmError> {
        let mut lines = Vec::with_capacity(self.joins.len());
        for join in self.joins.values() {
            let owner = ctx.metadata.require(&join.owner_entity)?;
            let target = ctx.metadata.require(&join.navigation.target)?;
            let Some(fk) = join.navigation.foreign_key.as_ref() else {
                return Err(TranslationError::MissingForeignKey { member: join.key.clone() }.into());
            };
            let mut conditions = Vec::new();
            for (inner, outer) in fk.pairs() {
                let left = Self::key_sql(ctx, &join.parent_alias, owner, join.owner_derived, inner)?;
                let right = Self::key_sql(ctx, &join.alias, target, false, outer)?;
                conditions.push(format!("{} = {}", left, right));
            }
            if let Some(predicate) = &join.predicate {
                conditions.push(format!("({})", predicate));
            }
            let mut line = format!("{} {} {}", ctx.dialect.join_keyword(crate::query::JoinKind::Left), ctx.quote(&target.table), join.alias);
            if let Some(hint) = ctx.dialect.table_hint(ctx.config) {
                line.push(' ');
                line.push_str(hint);
            }
            line.push_str(" ON ");
            line.push_str(&conditions.join(" AND "));
            lines.push(line);
        }
        Ok(lines)
    }

    fn key_sql(ctx: &TranslateContext, alias: &str, entity: &EntityMeta, derived: bool, key: &KeyRef) -> Result<String, OrmError> {
        match key {
            KeyRef::Constant(sql) => Ok(sql.clone()),
            KeyRef::Column(member) if derived => Ok(ctx.qualify(alias, member)),
            KeyRef::Column(member) => {
                let column = entity.get_column(member).ok_or_else(|| TranslationError::UnsupportedMember {
                    entity: entity.name.clone(),
                    member: member.clone(),
                })?;
                Ok(ctx.qualify(alias, &column.name))
            }
        }
    }
}
