use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::{debug, trace, warn};

use crate::{
    compiler::Command,
    error::MaterializationError,
    metadata::{DbType, EntityMeta, MetadataProvider},
    translator::{ColumnDescriptor, NavigationDescriptor},
};

/// Copies one row cell into one member.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub index: usize,
    pub member: String,
    /// Column alias, reported by conversion errors.
    pub column: String,
    pub db_type: Option<DbType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPlan {
    pub key: String,
    pub parent: Option<String>,
    pub member: String,
    pub many: bool,
    pub split_index: Option<usize>,
    pub assignments: Vec<Assignment>,
    /// Cells identifying one child, for de-duplication of sequence members.
    pub key_indices: Vec<usize>,
}

/// Column-to-member operations for one row shape, built once and reused for every row.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationPlan {
    pub target: String,
    pub root: Vec<Assignment>,
    pub root_keys: Vec<usize>,
    pub navigations: Vec<NavigationPlan>,
    pub has_many: bool,
}

impl MaterializationPlan {
    pub fn build(
        command: &Command,
        target: &str,
        field_count: usize,
        metadata: &dyn MetadataProvider,
    ) -> Result<Self, MaterializationError> {
        let columns = command.columns();
        if columns.len() > field_count {
            return Err(MaterializationError::ColumnOutOfRange { index: columns.len() - 1, field_count });
        }
        let navigations = command.navigations();
        let root_meta = command.entity().and_then(|e| metadata.entity(e));

        let root = columns.iter()
            .filter(|c| !navigations.owns(c.position))
            .map(|c| Self::assignment(c, root_meta))
            .collect();

        let mut plans = Vec::with_capacity(navigations.len());
        for descriptor in navigations.iter() {
            plans.push(Self::navigation(command, descriptor, metadata));
        }

        let plan = Self {
            target: target.to_string(),
            root,
            root_keys: command.root_keys().to_vec(),
            navigations: plans,
            has_many: command.has_many(),
        };
        trace!(
            target: "ormql::materializer",
            target_type = target,
            root_members = plan.root.len(),
            navigations = plan.navigations.len(),
            "built materialization plan"
        );
        if plan.has_many && plan.root_keys.is_empty() {
            warn!(target: "ormql::materializer", target_type = target, "to-many result without root keys, rows will not be merged");
        }
        Ok(plan)
    }

    fn navigation(command: &Command, descriptor: &NavigationDescriptor, metadata: &dyn MetadataProvider) -> NavigationPlan {
        let meta = descriptor.entity.as_deref().and_then(|e| metadata.entity(e));
        let assignments: Vec<Assignment> = descriptor.range()
            .filter(|p| Some(*p) != descriptor.split_index)
            .filter_map(|p| command.columns().get(p))
            .map(|c| Self::assignment(c, meta))
            .collect();

        let keyed: Vec<usize> = match meta {
            Some(meta) => assignments.iter()
                .filter(|a| meta.get_column(&a.member).map(|c| c.is_key).unwrap_or(false))
                .map(|a| a.index)
                .collect(),
            None => Vec::new(),
        };
        let key_indices = if keyed.is_empty() { assignments.iter().map(|a| a.index).collect() } else { keyed };

        NavigationPlan {
            key: descriptor.key.clone(),
            parent: descriptor.parent_key().map(str::to_string),
            member: descriptor.member.clone(),
            many: descriptor.many,
            split_index: descriptor.split_index,
            assignments,
            key_indices,
        }
    }

    fn assignment(column: &ColumnDescriptor, meta: Option<&EntityMeta>) -> Assignment {
        Assignment {
            index: column.position,
            member: column.name.clone(),
            column: column.alias.clone(),
            db_type: meta.and_then(|m| m.get_column(&column.name)).map(|c| c.db_type),
        }
    }
}

/// Plans keyed by command text and target type, shared across materializations.
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: RwLock<HashMap<(String, String), Arc<MaterializationPlan>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        command: &Command,
        target: &str,
        field_count: usize,
        metadata: &dyn MetadataProvider,
    ) -> Result<Arc<MaterializationPlan>, MaterializationError> {
        let key = (command.text().to_string(), target.to_string());
        {
            let plans = self.plans.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(plan) = plans.get(&key) {
                debug!(target: "ormql::materializer", target_type = target, "materialization plan cache hit");
                return Ok(Arc::clone(plan));
            }
        }
        let plan = Arc::new(MaterializationPlan::build(command, target, field_count, metadata)?);
        let mut plans = self.plans.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Arc::clone(plans.entry(key).or_insert(plan)))
    }

    pub fn len(&self) -> usize {
        self.plans.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::QueryCompiler,
        dialect::SqlServer,
        metadata::{ColumnMeta, ForeignKey, MetadataRegistry, NavigationMeta},
        query::{Include, SelectQuery},
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("No", DbType::String))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "OrderId"))))
            .unwrap()
            .with(EntityMeta::new("Item", "Items")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("OrderId", DbType::Int)))
            .unwrap()
    }

    fn command(reg: &MetadataRegistry) -> Command {
        QueryCompiler::new(Arc::new(SqlServer::new()), reg)
            .compile_select(&SelectQuery::from("Order", "a").include(Include::new("a.Items")))
            .unwrap()
    }

    #[test]
    fn navigation_ranges_are_excluded_from_the_root() {
        let reg = registry();
        let plan = MaterializationPlan::build(&command(&reg), "Order", 5, &reg).unwrap();
        let members: Vec<_> = plan.root.iter().map(|a| a.member.as_str()).collect();
        assert_eq!(members, vec!["Id", "No"]);
        assert_eq!(plan.root[0].db_type, Some(DbType::Int));

        let items = &plan.navigations[0];
        assert_eq!(items.split_index, Some(2));
        let members: Vec<_> = items.assignments.iter().map(|a| (a.index, a.member.as_str(), a.column.as_str())).collect();
        assert_eq!(members, vec![(3, "Id", "Id1"), (4, "OrderId", "OrderId")]);
        assert_eq!(items.key_indices, vec![3]);
        assert!(plan.has_many);
    }

    #[test]
    fn narrow_rows_are_rejected() {
        let reg = registry();
        let err = MaterializationPlan::build(&command(&reg), "Order", 3, &reg).unwrap_err();
        assert_eq!(err, MaterializationError::ColumnOutOfRange { index: 4, field_count: 3 });
    }

    #[test]
    fn plans_are_cached_per_text_and_target() {
        let reg = registry();
        let command = command(&reg);
        let cache = PlanCache::new();
        let first = cache.get_or_build(&command, "Order", 5, &reg).unwrap();
        let second = cache.get_or_build(&command, "Order", 5, &reg).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        cache.get_or_build(&command, "OrderDto", 5, &reg).unwrap();
        assert_eq!(cache.len(), 2);
    }
}
