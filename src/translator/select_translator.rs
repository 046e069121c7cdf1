use std::collections::HashSet;

use crate::{
    error::{OrmError, TranslationError},
    metadata::{EntityMeta, NavigationMeta},
    query::{Binding, BindingValue, Expr, Include, MemberPath, Projection, SelectQuery},
    translator::{
        ColumnDescriptors, ExpressionTranslator, NavigationDescriptor, NavigationDescriptors, ResolvedMember,
        TranslateContext, SPLIT_COLUMN,
    },
};

/// Select list of one statement level and the descriptors the materializer reads it with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOutput {
    pub items: Vec<String>,
    pub columns: ColumnDescriptors,
    pub navigations: NavigationDescriptors,
    /// Entity every row hydrates into, `None` for scalar and anonymous projections.
    pub entity: Option<String>,
    /// Positions compared by the continuation check of to-many results.
    pub root_keys: Vec<usize>,
}

impl SelectOutput {
    fn push(&mut self, ctx: &TranslateContext, name: &str, sql: String, source_column: Option<&str>) -> usize {
        let alias = self.columns.add(name);
        let item = if source_column == Some(alias.as_str()) { sql } else { format!("{} AS {}", sql, ctx.quote(&alias)) };
        self.items.push(item);
        self.columns.len() - 1
    }

    fn entity_columns(&mut self, ctx: &TranslateContext, alias: &str, meta: &EntityMeta, derived: bool) -> Vec<usize> {
        let mut positions = Vec::new();
        for column in meta.mapped_columns() {
            let source = if derived { &column.member } else { &column.name };
            positions.push(self.push(ctx, &column.member, ctx.qualify(alias, source), Some(source)));
        }
        positions
    }

    fn anonymous_columns(&mut self, ctx: &TranslateContext, alias: &str, names: &[String]) {
        for name in names {
            self.push(ctx, name, ctx.qualify(alias, name), Some(name));
        }
    }
}

pub struct SelectTranslator;

impl SelectTranslator {
    pub fn translate(et: &mut ExpressionTranslator, query: &SelectQuery) -> Result<SelectOutput, OrmError> {
        let mut out = SelectOutput::default();
        match &query.select {
            None => Self::root_source(et, &mut out, &query.label)?,
            Some(Projection::Entity(label)) => Self::root_source(et, &mut out, label)?,
            Some(Projection::Scalar(expr)) => Self::scalar(et, &mut out, expr)?,
            Some(Projection::Object(bindings)) => {
                Self::object(et, &mut out, bindings, None)?;
                out.root_keys = (0..out.columns.len()).filter(|p| !out.navigations.owns(*p)).collect();
            }
        }

        if !query.includes.is_empty() {
            let whole_root = match &query.select {
                None => true,
                Some(Projection::Entity(label)) => *label == query.label,
                _ => false,
            };
            if !whole_root {
                return Err(TranslationError::UnsupportedProjection(
                    "includes require the root entity to be selected as a whole".into(),
                ).into());
            }
            for include in &query.includes {
                Self::include(et, &mut out, &query.label, include)?;
            }
        }
        Ok(out)
    }

    fn root_source(et: &mut ExpressionTranslator, out: &mut SelectOutput, label: &str) -> Result<(), OrmError> {
        let path = MemberPath { source: label.to_string(), members: Vec::new() };
        match et.resolve_member(&path)? {
            ResolvedMember::Entity { alias, entity: Some(entity), derived_columns, .. } => {
                let meta = et.ctx.metadata.require(&entity)?;
                let columns = out.entity_columns(et.ctx, &alias, meta, derived_columns.is_some());
                out.root_keys = Self::key_positions(meta, &columns);
                out.entity = Some(entity);
            }
            ResolvedMember::Entity { alias, entity: None, derived_columns, .. } => {
                out.anonymous_columns(et.ctx, &alias, derived_columns.as_deref().unwrap_or_default());
                out.root_keys = (0..out.columns.len()).collect();
            }
            ResolvedMember::Column { .. } => not_a_source(label)?,
        }
        Ok(())
    }

    fn scalar(et: &mut ExpressionTranslator, out: &mut SelectOutput, expr: &Expr) -> Result<(), OrmError> {
        if let Expr::Member(path) = expr {
            if let ResolvedMember::Entity { alias, entity, navigation, derived_columns, .. } = et.resolve_member(path)? {
                if navigation.as_ref().map(|n| n.many).unwrap_or(false) {
                    return Err(TranslationError::UnsupportedProjection(format!(
                        "'{}' is a sequence; load it through an include or an object binding", path
                    )).into());
                }
                match entity {
                    Some(entity) => {
                        let meta = et.ctx.metadata.require(&entity)?;
                        let columns = out.entity_columns(et.ctx, &alias, meta, derived_columns.is_some());
                        out.root_keys = Self::key_positions(meta, &columns);
                        out.entity = Some(entity);
                    }
                    None => out.anonymous_columns(et.ctx, &alias, derived_columns.as_deref().unwrap_or_default()),
                }
                return Ok(());
            }
        }
        let sql = et.translate(expr)?;
        let name = expr.as_member().and_then(MemberPath::last).unwrap_or("Value").to_string();
        out.push(et.ctx, &name, sql, None);
        Ok(())
    }

    /// Scalar bindings first, in declaration order, then navigations, sources and nested objects.
    fn object(
        et: &mut ExpressionTranslator,
        out: &mut SelectOutput,
        bindings: &[Binding],
        parent_key: Option<&str>,
    ) -> Result<(), OrmError> {
        if bindings.is_empty() {
            return Err(TranslationError::UnsupportedProjection("an object projection needs at least one member".into()).into());
        }
        let mut names = HashSet::new();
        for binding in bindings {
            if !names.insert(binding.name.as_str()) {
                return Err(TranslationError::UnsupportedProjection(format!("member '{}' is bound twice", binding.name)).into());
            }
        }

        for binding in bindings.iter().filter(|b| b.is_scalar()) {
            if let BindingValue::Expr(expr) = &binding.value {
                let sql = et.translate(expr)?;
                out.push(et.ctx, &binding.name, sql, None);
            }
        }

        for binding in bindings.iter().filter(|b| !b.is_scalar()) {
            let key = match parent_key {
                Some(parent) => format!("{}.{}", parent, binding.name),
                None => binding.name.clone(),
            };
            match &binding.value {
                BindingValue::Expr(_) => {}
                BindingValue::Navigation(path) => Self::navigation(et, out, path, &key, &binding.name)?,
                BindingValue::Source(label) => {
                    let path = MemberPath { source: label.clone(), members: Vec::new() };
                    Self::navigation(et, out, &path, &key, &binding.name)?;
                }
                BindingValue::Object(inner) => {
                    let start = out.columns.len();
                    let scalars = inner.iter().filter(|b| b.is_scalar()).count();
                    out.navigations.add(NavigationDescriptor {
                        key: key.clone(),
                        member: binding.name.clone(),
                        entity: None,
                        many: false,
                        start,
                        field_count: scalars,
                        split_index: None,
                        predicate: None,
                    });
                    Self::object(et, out, inner, Some(&key))?;
                }
            }
        }
        Ok(())
    }

    /// A navigation or joined source hydrated as a sub-entity of the row.
    fn navigation(
        et: &mut ExpressionTranslator,
        out: &mut SelectOutput,
        path: &MemberPath,
        key: &str,
        member: &str,
    ) -> Result<(), OrmError> {
        let ResolvedMember::Entity { alias, entity, navigation, derived_columns, .. } = et.resolve_member(path)? else {
            return Err(TranslationError::UnsupportedProjection(format!("'{}' is not a navigation", path)).into());
        };
        let start = out.columns.len();
        let mut split_index = None;
        let meta = match &entity {
            Some(name) => Some(et.ctx.metadata.require(name)?),
            None => None,
        };
        if let (Some(meta), Some(nav)) = (meta, navigation.as_ref()) {
            if let Some(column) = Self::split_column(meta, nav) {
                split_index = Some(out.push(et.ctx, SPLIT_COLUMN, et.ctx.qualify(&alias, &column), None));
            }
        }
        match meta {
            Some(meta) => {
                out.entity_columns(et.ctx, &alias, meta, derived_columns.is_some());
            }
            None => out.anonymous_columns(et.ctx, &alias, derived_columns.as_deref().unwrap_or_default()),
        }
        out.navigations.add(NavigationDescriptor {
            key: key.to_string(),
            member: member.to_string(),
            entity,
            many: navigation.map(|n| n.many).unwrap_or(false),
            start,
            field_count: out.columns.len() - start,
            split_index,
            predicate: None,
        });
        Ok(())
    }

    fn include(et: &mut ExpressionTranslator, out: &mut SelectOutput, label: &str, include: &Include) -> Result<(), OrmError> {
        // picks and filters read the included sequence itself
        et.set_allow_sequence_members(true);
        let result = Self::include_path(et, out, label, include);
        et.set_allow_sequence_members(false);
        result
    }

    fn include_path(et: &mut ExpressionTranslator, out: &mut SelectOutput, label: &str, include: &Include) -> Result<(), OrmError> {
        let path = &include.path;
        if path.source != label || path.members.is_empty() {
            return Err(TranslationError::UnsupportedProjection(format!(
                "include '{}' must start at the root label '{}'", path, label
            )).into());
        }
        for depth in 1..=path.members.len() {
            let last = depth == path.members.len();
            let relative = path.members[..depth].join(".");
            if out.navigations.contains(&relative) {
                continue;
            }
            let prefix = MemberPath { source: path.source.clone(), members: path.members[..depth].to_vec() };
            let ResolvedMember::Entity { alias, entity: Some(entity), navigation: Some(nav), .. } = et.resolve_member(&prefix)? else {
                return Err(TranslationError::UnsupportedProjection(format!("'{}' is not a navigation", prefix)).into());
            };
            let meta = et.ctx.metadata.require(&entity)?;
            let start = out.columns.len();
            let split_index = Self::split_column(meta, &nav)
                .map(|column| out.push(et.ctx, SPLIT_COLUMN, et.ctx.qualify(&alias, &column), None));

            if last && !include.pick.is_empty() {
                for binding in &include.pick {
                    let BindingValue::Expr(expr) = &binding.value else {
                        return Err(TranslationError::UnsupportedProjection(format!(
                            "include pick '{}' must be a scalar member", binding.name
                        )).into());
                    };
                    let sql = et.translate(expr)?;
                    out.push(et.ctx, &binding.name, sql, None);
                }
            } else {
                out.entity_columns(et.ctx, &alias, meta, false);
            }

            out.navigations.add(NavigationDescriptor {
                key: relative,
                member: path.members[depth - 1].clone(),
                entity: Some(entity),
                many: nav.many,
                start,
                field_count: out.columns.len() - start,
                split_index,
                predicate: None,
            });
        }

        if let Some(predicate) = &include.predicate {
            et.set_allow_navigation(false);
            let sql = et.translate_predicate(predicate);
            et.set_allow_navigation(true);
            let sql = sql?;
            et.navigations.set_predicate(&path.to_string(), sql.clone())?;
            if let Some(descriptor) = out.navigations.get_mut(&path.relative()) {
                descriptor.predicate = Some(sql);
            }
        }
        Ok(())
    }

    /// Column whose null-ness says the LEFT JOIN matched nothing: the first joined
    /// member of the target, else its first key.
    fn split_column(target: &EntityMeta, navigation: &NavigationMeta) -> Option<String> {
        navigation.foreign_key.as_ref()
            .and_then(|fk| fk.split_member())
            .and_then(|member| target.get_column(member))
            .or_else(|| target.keys().next())
            .map(|column| column.name.clone())
    }

    fn key_positions(meta: &EntityMeta, positions: &[usize]) -> Vec<usize> {
        meta.mapped_columns()
            .zip(positions.iter())
            .filter(|(column, _)| column.is_key)
            .map(|(_, position)| *position)
            .collect()
    }
}

fn not_a_source(label: &str) -> Result<(), OrmError> {
    Err(TranslationError::UnsupportedProjection(format!("'{}' is not a source", label)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CompilerConfig,
        dialect::SqlServer,
        metadata::{ColumnMeta, DbType, ForeignKey, MetadataRegistry},
        translator::{AliasScope, NavigationResolver, TranslateContext},
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("No", DbType::String).column_name("order_no"))
                .column(ColumnMeta::new("ClientId", DbType::Int))
                .navigation(NavigationMeta::one("Client", "Client", ForeignKey::single("ClientId", "Id")))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "OrderId"))))
            .unwrap()
            .with(EntityMeta::new("Client", "Clients")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("Name", DbType::String)))
            .unwrap()
            .with(EntityMeta::new("Item", "Items")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("OrderId", DbType::Int))
                .column(ColumnMeta::new("Qty", DbType::Int)))
            .unwrap()
    }

    fn translate(query: &SelectQuery) -> (SelectOutput, Vec<String>) {
        let reg = registry();
        let dialect = SqlServer::new();
        let config = CompilerConfig::inline();
        let mut ctx = TranslateContext::new(&dialect, &reg, &config);
        let mut scope = AliasScope::new();
        scope.bind_source(&query.label, Some("Order"), None).unwrap();
        let mut navs = NavigationResolver::new();
        let out = {
            let mut et = ExpressionTranslator::new(&mut ctx, &mut scope, &mut navs, 0);
            SelectTranslator::translate(&mut et, query).unwrap()
        };
        let joins = navs.emit(&ctx).unwrap();
        (out, joins)
    }

    #[test]
    fn entity_projection_aliases_renamed_columns() {
        let (out, joins) = translate(&SelectQuery::from("Order", "a"));
        assert_eq!(out.items, vec!["t0.[Id]", "t0.[order_no] AS [No]", "t0.[ClientId]"]);
        assert_eq!(out.entity.as_deref(), Some("Order"));
        assert_eq!(out.root_keys, vec![0]);
        assert!(joins.is_empty());
    }

    #[test]
    fn includes_add_split_columns_and_descriptors() {
        let query = SelectQuery::from("Order", "a")
            .include(Include::new("a.Client"))
            .include(Include::new("a.Items").filter(Expr::col("a", "Items.Qty").gt(Expr::val(0))));
        let (out, joins) = translate(&query);
        assert_eq!(out.items[3], "t1.[Id] AS [NavigationSplitOn__]");
        assert_eq!(out.items[4], "t1.[Id] AS [Id1]");
        assert_eq!(out.items[6], "t2.[OrderId] AS [NavigationSplitOn__1]");

        let client = out.navigations.get("Client").unwrap();
        assert_eq!((client.start, client.field_count, client.split_index), (3, 3, Some(3)));
        assert!(!client.many);
        let items = out.navigations.get("Items").unwrap();
        assert_eq!((items.start, items.field_count, items.split_index), (6, 4, Some(6)));
        assert!(items.many);
        assert_eq!(items.predicate.as_deref(), Some("t2.[Qty] > 0"));
        assert_eq!(joins[1], "LEFT JOIN [Items] t2 ON t0.[Id] = t2.[OrderId] AND (t2.[Qty] > 0)");
    }

    #[test]
    fn object_projection_puts_scalars_first() {
        let query = SelectQuery::from("Order", "a").select(Projection::Object(vec![
            Binding::navigation("Buyer", "a.Client"),
            Binding::expr("No", Expr::col("a", "No")),
            Binding::object("Meta", vec![Binding::expr("ClientName", Expr::col("a", "Client.Name"))]),
        ]));
        let (out, _) = translate(&query);
        assert_eq!(out.items[0], "t0.[order_no] AS [No]");
        assert_eq!(out.root_keys, vec![0]);
        let buyer = out.navigations.get("Buyer").unwrap();
        assert_eq!((buyer.start, buyer.field_count), (1, 3));
        let meta = out.navigations.get("Meta").unwrap();
        assert_eq!((meta.start, meta.field_count, meta.entity.clone()), (4, 1, None));
        assert_eq!(out.items[4], "t1.[Name] AS [ClientName]");
    }

    #[test]
    fn bad_projections_are_rejected() {
        let reg = registry();
        let dialect = SqlServer::new();
        let config = CompilerConfig::inline();
        let mut ctx = TranslateContext::new(&dialect, &reg, &config);
        let mut scope = AliasScope::new();
        scope.bind_source("a", Some("Order"), None).unwrap();
        let mut navs = NavigationResolver::new();
        let mut et = ExpressionTranslator::new(&mut ctx, &mut scope, &mut navs, 0);

        let empty = SelectQuery::from("Order", "a").select(Projection::Object(vec![]));
        assert!(matches!(SelectTranslator::translate(&mut et, &empty), Err(OrmError::Translation(TranslationError::UnsupportedProjection(_)))));
        let twice = SelectQuery::from("Order", "a").select(Projection::Object(vec![
            Binding::expr("X", Expr::col("a", "Id")),
            Binding::expr("X", Expr::col("a", "No")),
        ]));
        assert!(matches!(SelectTranslator::translate(&mut et, &twice), Err(OrmError::Translation(TranslationError::UnsupportedProjection(_)))));
        let scalar_with_include = SelectQuery::from("Order", "a")
            .select(Projection::Scalar(Expr::col("a", "Id")))
            .include(Include::new("a.Client"));
        assert!(SelectTranslator::translate(&mut et, &scalar_with_include).is_err());
    }

    #[test]
    fn sequence_members_are_readable_only_inside_includes() {
        let reg = registry();
        let dialect = SqlServer::new();
        let config = CompilerConfig::inline();
        let mut ctx = TranslateContext::new(&dialect, &reg, &config);
        let mut scope = AliasScope::new();
        scope.bind_source("a", Some("Order"), None).unwrap();
        let mut navs = NavigationResolver::new();
        let mut et = ExpressionTranslator::new(&mut ctx, &mut scope, &mut navs, 0);

        let flattened = SelectQuery::from("Order", "a").select(Projection::Object(vec![
            Binding::expr("Id", Expr::col("a", "Id")),
            Binding::expr("Qty", Expr::col("a", "Items.Qty")),
        ]));
        assert!(matches!(
            SelectTranslator::translate(&mut et, &flattened),
            Err(OrmError::Translation(TranslationError::Unsupported(_)))
        ));

        let included = SelectQuery::from("Order", "a")
            .include(Include::new("a.Items").filter(Expr::col("a", "Items.Qty").gt(Expr::val(0))));
        assert!(SelectTranslator::translate(&mut et, &included).is_ok());
    }
}
