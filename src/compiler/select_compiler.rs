use tracing::debug;

use crate::{
    compiler::SelectFragments,
    error::{OrmError, TranslationError},
    query::{AggregateCall, AggregateKind, Binding, Projection, SelectQuery},
    translator::{
        AliasScope, BoundSource, ColumnDescriptors, ExpressionTranslator, GroupByTranslator, HavingTranslator,
        JoinTranslator, NavigationDescriptors, NavigationResolver, OrderByTranslator, SelectOutput, SelectTranslator,
        TranslateContext, WhereTranslator,
    },
};

/// Text and descriptors of one compiled select level.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelect {
    pub text: String,
    pub columns: ColumnDescriptors,
    pub navigations: NavigationDescriptors,
    pub has_many: bool,
    pub entity: Option<String>,
    pub root_keys: Vec<usize>,
}

impl CompiledSelect {
    fn single(text: String, name: &str) -> Self {
        let mut columns = ColumnDescriptors::new();
        columns.add(name);
        Self {
            text,
            columns,
            navigations: NavigationDescriptors::new(),
            has_many: false,
            entity: None,
            root_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Head<'q> {
    Projection,
    /// `SELECT 1`, for existence checks.
    One,
    Aggregate(&'q AggregateCall),
}

pub struct SelectCompiler;

impl SelectCompiler {
    /// Compiles `query` at nesting `depth`. `nested` marks derived tables and subqueries,
    /// where ORDER BY is only kept when the level paginates.
    pub fn compile(
        ctx: &mut TranslateContext,
        query: &SelectQuery,
        scope: AliasScope,
        depth: usize,
        nested: bool,
    ) -> Result<CompiledSelect, OrmError> {
        if query.skip > 0 && query.order_by.is_empty() {
            return Err(TranslationError::SkipWithoutOrderBy.into());
        }
        if query.any {
            return Self::exists(ctx, query, depth);
        }
        if let Some(call) = &query.aggregate {
            return Self::aggregate(ctx, query, call, scope, depth, nested);
        }

        let has_many = query.has_many(ctx.metadata);
        if has_many && !query.unions.is_empty() {
            return Err(TranslationError::MalformedUnion("a select loading to-many navigations cannot be combined".into()).into());
        }
        let mut compiled = if has_many && (query.is_paged() || query.distinct) {
            Self::paged_many(ctx, query, depth)?
        } else {
            Self::flat(ctx, query, scope, depth, Head::Projection, None, nested)?
        };
        if !query.unions.is_empty() {
            Self::unions(ctx, query, &mut compiled, depth, nested)?;
        }
        Ok(compiled)
    }

    #[allow(clippy::too_many_arguments)]
    fn flat(
        ctx: &mut TranslateContext,
        query: &SelectQuery,
        mut scope: AliasScope,
        depth: usize,
        head: Head,
        base: Option<BoundSource>,
        nested: bool,
    ) -> Result<CompiledSelect, OrmError> {
        let from = match base {
            Some(bound) => bound,
            None => JoinTranslator::bind(ctx, &mut scope, &query.from, &query.label, depth)?,
        };
        let mut bound_joins = Vec::with_capacity(query.joins.len());
        for join in &query.joins {
            bound_joins.push(JoinTranslator::bind(ctx, &mut scope, &join.source, &join.label, depth)?);
        }
        let root_order = Self::root_order_terms(ctx, &scope, &query.label)?;

        let paged = query.is_paged();
        let keep_order = !(nested && !paged) && match head {
            Head::Projection => true,
            Head::One => query.skip > 0,
            Head::Aggregate(_) => false,
        };

        let mut navigations = NavigationResolver::new();
        let mut fragments = SelectFragments::new(ctx.pad(depth));
        fragments.from = from.sql;

        let output = {
            let mut et = ExpressionTranslator::new(ctx, &mut scope, &mut navigations, depth)
                .with_group_by(query.group_by.as_ref());
            let output = match head {
                Head::Projection => SelectTranslator::translate(&mut et, query)?,
                Head::One => Self::single_output("1".to_string(), "Exists"),
                Head::Aggregate(call) => {
                    let sql = Self::aggregate_sql(&mut et, query, call)?;
                    Self::single_output(sql, call.kind.name())
                }
            };

            let mut head_sql = String::from("SELECT ");
            if query.distinct {
                head_sql.push_str("DISTINCT ");
            }
            if paged {
                if let Some(prefix) = et.ctx.dialect.page_prefix(query.skip, query.take) {
                    head_sql.push_str(&prefix);
                    head_sql.push(' ');
                }
            }
            head_sql.push_str(&output.items.join(", "));
            fragments.head = head_sql;

            for (join, bound) in query.joins.iter().zip(&bound_joins) {
                fragments.joins.push(JoinTranslator::translate(&mut et, join, bound)?);
            }
            fragments.filter = WhereTranslator::translate(&mut et, query.filter.as_ref())?;
            fragments.group_by = GroupByTranslator::translate(&mut et, query.group_by.as_ref())?;
            fragments.having = HavingTranslator::translate(&mut et, query.having.as_ref(), query.group_by.is_some())?;
            if keep_order {
                let extra: &[String] = if et.navigations.has_many() && et.ctx.config.enforce_root_order {
                    &root_order
                } else {
                    &[]
                };
                fragments.order_by = OrderByTranslator::translate(&mut et, &query.order_by, extra)?;
            }
            output
        };

        if paged {
            fragments.page_suffix = ctx.dialect.page_suffix(query.skip, query.take);
        }
        fragments.set_navigation_joins(navigations.emit(ctx)?);
        let mut text = fragments.converge().to_string();
        if paged {
            text = ctx.dialect.page_wrap(text, query.skip, query.take);
        }

        Ok(CompiledSelect {
            text,
            columns: output.columns,
            navigations: output.navigations,
            has_many: navigations.has_many(),
            entity: output.entity,
            root_keys: output.root_keys,
        })
    }

    /// Paging a to-many select: the root rows are paged in a derived table bound at the
    /// base alias, the navigation joins run outside of it.
    fn paged_many(ctx: &mut TranslateContext, query: &SelectQuery, depth: usize) -> Result<CompiledSelect, OrmError> {
        // explicit joins stay inside the paged table, which only projects the root
        if let Some(join) = query.joins.iter().find(|j| Self::read_outside_page(query, &j.label)) {
            return Err(TranslationError::UnsupportedProjection(format!(
                "a paged select loading sequences cannot project or order by the joined source '{}'", join.label
            )).into());
        }
        let mut inner = query.clone();
        inner.select = None;
        inner.includes.clear();
        inner.unions.clear();
        if !query.is_paged() {
            inner.order_by.clear();
        }
        let compiled = Self::compile(ctx, &inner, AliasScope::new(), depth + 1, true)?;
        debug!(target: "ormql::compiler", label = %query.label, skip = query.skip, take = query.take, "paging roots of a to-many select in a subquery");

        let mut scope = AliasScope::new();
        let alias = scope.bind_base(&query.label, compiled.entity.as_deref(), Some(compiled.columns.aliases()))?;
        let base = BoundSource { sql: format!("(\n{}\n{}) {}", compiled.text, ctx.pad(depth), alias), alias };

        let mut outer = query.clone();
        outer.joins.clear();
        outer.filter = None;
        outer.group_by = None;
        outer.having = None;
        outer.skip = 0;
        outer.take = 0;
        outer.distinct = false;
        outer.unions.clear();
        Self::flat(ctx, &outer, scope, depth, Head::Projection, Some(base), false)
    }

    fn read_outside_page(query: &SelectQuery, label: &str) -> bool {
        query.select.as_ref().map(|p| p.references(label)).unwrap_or(false)
            || query.order_by.iter().any(|o| o.expr.references(label))
            || query.includes.iter().any(|i| {
                i.path.source == label
                    || i.predicate.as_ref().map(|p| p.references(label)).unwrap_or(false)
                    || i.pick.iter().any(|b| b.references(label))
            })
    }

    fn aggregate(
        ctx: &mut TranslateContext,
        query: &SelectQuery,
        call: &AggregateCall,
        scope: AliasScope,
        depth: usize,
        nested: bool,
    ) -> Result<CompiledSelect, OrmError> {
        let wrap = query.distinct || query.group_by.is_some() || query.is_paged() || !query.unions.is_empty();
        if !wrap {
            let mut plain = query.clone();
            plain.includes.clear();
            return Self::flat(ctx, &plain, scope, depth, Head::Aggregate(call), None, nested);
        }

        let mut inner = query.clone();
        inner.aggregate = None;
        inner.includes.clear();
        match (&call.arg, call.kind) {
            (Some(arg), _) => inner.select = Some(Projection::Scalar((**arg).clone())),
            (None, AggregateKind::Count) => {
                // grouped rows can only expose their keys
                if let (None, Some(group_by)) = (&inner.select, &query.group_by) {
                    inner.select = Some(Projection::Object(
                        group_by.keys.iter().map(|(name, expr)| Binding::expr(name, expr.clone())).collect(),
                    ));
                }
            }
            (None, kind) => {
                if !matches!(inner.select, Some(Projection::Scalar(_))) {
                    return Err(TranslationError::ArgumentMismatch {
                        method: kind.name().to_string(),
                        expected: "1".into(),
                        found: 0,
                    }.into());
                }
            }
        }

        let compiled = Self::compile(ctx, &inner, AliasScope::new(), depth + 1, true)?;
        debug!(target: "ormql::compiler", aggregate = call.kind.name(), "wrapping aggregate around a subquery");

        let mut scope = scope;
        let alias = scope.bind_base(&query.label, None, Some(compiled.columns.aliases()))?;
        let arg = match call.kind {
            AggregateKind::Count => "1".to_string(),
            _ => {
                let column = compiled.columns.get(0).ok_or_else(|| {
                    TranslationError::UnsupportedProjection("aggregate over an empty projection".into())
                })?;
                ctx.qualify(&alias, &column.alias)
            }
        };
        let pad = ctx.pad(depth);
        let text = format!(
            "{pad}SELECT {agg}\n{pad}FROM (\n{inner}\n{pad}) {alias}",
            pad = pad,
            agg = ctx.dialect.aggregate(call.kind, &arg),
            inner = compiled.text,
            alias = alias,
        );
        Ok(CompiledSelect::single(text, call.kind.name()))
    }

    fn exists(ctx: &mut TranslateContext, query: &SelectQuery, depth: usize) -> Result<CompiledSelect, OrmError> {
        if !query.unions.is_empty() {
            return Err(TranslationError::MalformedUnion("an existence check cannot combine unions".into()).into());
        }
        let mut inner = query.clone();
        inner.any = false;
        inner.aggregate = None;
        inner.select = None;
        inner.includes.clear();
        if inner.skip == 0 {
            inner.order_by.clear();
        }
        inner.take = 1;
        let compiled = Self::flat(ctx, &inner, AliasScope::new(), depth + 1, Head::One, None, true)?;
        Ok(CompiledSelect::single(ctx.dialect.exists_wrap(&compiled.text), "Exists"))
    }

    fn unions(
        ctx: &mut TranslateContext,
        query: &SelectQuery,
        compiled: &mut CompiledSelect,
        depth: usize,
        nested: bool,
    ) -> Result<(), OrmError> {
        if compiled.has_many {
            return Err(TranslationError::MalformedUnion("a select loading to-many navigations cannot be combined".into()).into());
        }
        for branch in &query.unions {
            if branch.has_many(ctx.metadata) {
                return Err(TranslationError::MalformedUnion("a union branch cannot load to-many navigations".into()).into());
            }
            let other = Self::compile(ctx, branch, AliasScope::new(), depth, nested)?;
            if other.columns.len() != compiled.columns.len() {
                return Err(TranslationError::MalformedUnion(format!(
                    "branch selects {} column(s), the first one selects {}",
                    other.columns.len(),
                    compiled.columns.len()
                )).into());
            }
            compiled.text = format!("{}\n{}{}\n{}", compiled.text, ctx.pad(depth), ctx.dialect.union_keyword(), other.text);
        }
        Ok(())
    }

    fn aggregate_sql(et: &mut ExpressionTranslator, query: &SelectQuery, call: &AggregateCall) -> Result<String, OrmError> {
        let arg = match (&call.arg, call.kind, &query.select) {
            (Some(arg), _, _) => et.translate(arg)?,
            (None, AggregateKind::Count, _) => "1".to_string(),
            (None, _, Some(Projection::Scalar(expr))) => et.translate(expr)?,
            (None, kind, _) => {
                return Err(TranslationError::ArgumentMismatch {
                    method: kind.name().to_string(),
                    expected: "1".into(),
                    found: 0,
                }.into())
            }
        };
        Ok(et.ctx.dialect.aggregate(call.kind, &arg))
    }

    fn single_output(sql: String, name: &str) -> SelectOutput {
        let mut output = SelectOutput::default();
        output.columns.add(name);
        output.items.push(sql);
        output
    }

    /// Key columns of the root source, for the ORDER BY of to-many selects.
    fn root_order_terms(ctx: &TranslateContext, scope: &AliasScope, label: &str) -> Result<Vec<String>, OrmError> {
        let binding = scope.source(label)?;
        let Some(entity) = &binding.entity else { return Ok(Vec::new()) };
        let meta = ctx.metadata.require(entity)?;
        Ok(meta.keys()
            .map(|key| ctx.qualify(&binding.alias, if binding.is_derived() { &key.member } else { &key.name }))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CompilerConfig,
        dialect::{Dialect, Oracle, Postgres, SqlServer},
        metadata::{ColumnMeta, DbType, EntityMeta, ForeignKey, MetadataRegistry, NavigationMeta},
        query::{Expr, GroupBy, Include},
        translator::Parameter,
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("No", DbType::String))
                .column(ColumnMeta::new("ClientId", DbType::Int))
                .column(ColumnMeta::new("Total", DbType::Decimal))
                .navigation(NavigationMeta::one("Client", "Client", ForeignKey::single("ClientId", "Id")))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "OrderId")))
                .navigation(NavigationMeta::many("Payments", "Payment", ForeignKey::single("Id", "OrderId"))))
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
            .with(EntityMeta::new("Payment", "Payments")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("OrderId", DbType::Int))
                .column(ColumnMeta::new("Amount", DbType::Decimal)))
            .unwrap()
    }

    fn compile_with(dialect: &dyn Dialect, config: &CompilerConfig, query: &SelectQuery) -> Result<(CompiledSelect, Vec<Parameter>), OrmError> {
        let reg = registry();
        let mut ctx = TranslateContext::new(dialect, &reg, config);
        let compiled = SelectCompiler::compile(&mut ctx, query, AliasScope::new(), 0, false)?;
        Ok((compiled, ctx.parameters.into_vec()))
    }

    fn compile(query: &SelectQuery) -> CompiledSelect {
        compile_with(&SqlServer::new(), &CompilerConfig::default(), query).unwrap().0
    }

    const ORDER_COLUMNS: &str = "t0.[Id], t0.[No], t0.[ClientId], t0.[Total]";

    #[test]
    fn skip_requires_an_ordering() {
        let query = SelectQuery::from("Order", "a").skip(5);
        let err = compile_with(&SqlServer::new(), &CompilerConfig::default(), &query).unwrap_err();
        assert_eq!(err, OrmError::Translation(TranslationError::SkipWithoutOrderBy));
    }

    #[test]
    fn offset_follows_order_by() {
        let query = SelectQuery::from("Order", "a")
            .filter(Expr::col("a", "ClientId").eq(Expr::val(3)))
            .order_by(Expr::col("a", "No"))
            .skip(10)
            .take(5);
        let (compiled, params) = compile_with(&SqlServer::new(), &CompilerConfig::default(), &query).unwrap();
        assert_eq!(compiled.text, format!(
            "SELECT {}\nFROM [Orders] t0\nWHERE t0.[ClientId] = @p0\nORDER BY t0.[No]\nOFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY",
            ORDER_COLUMNS
        ));
        assert_eq!(params.len(), 1);
        assert_eq!(compiled.root_keys, vec![0]);

        let (compiled, _) = compile_with(&Postgres::new(), &CompilerConfig::default(), &query).unwrap();
        assert!(compiled.text.ends_with("ORDER BY t0.\"No\"\nLIMIT 5 OFFSET 10"));
    }

    #[test]
    fn compilation_is_deterministic() {
        let query = SelectQuery::from("Order", "a")
            .include(Include::new("a.Client"))
            .include(Include::new("a.Items"))
            .filter(Expr::col("a", "Client.Name").eq(Expr::val("x")))
            .order_by(Expr::col("a", "No"));
        let first = compile_with(&SqlServer::new(), &CompilerConfig::default(), &query).unwrap();
        let second = compile_with(&SqlServer::new(), &CompilerConfig::default(), &query).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn navigations_are_joined_once_with_distinct_aliases() {
        let query = SelectQuery::from("Order", "a")
            .include(Include::new("a.Client"))
            .filter(Expr::col("a", "Client.Name").eq(Expr::val("x")))
            .order_by(Expr::col("a", "Client.Name"));
        let text = compile(&query).text;
        assert_eq!(text.matches("LEFT JOIN [Clients]").count(), 1);
        assert!(text.contains("LEFT JOIN [Clients] t1 ON t0.[ClientId] = t1.[Id]"));
        assert!(text.contains("WHERE t1.[Name] = @p0"));
        assert!(text.ends_with("ORDER BY t1.[Name]"));
    }

    #[test]
    fn to_many_selects_append_root_keys_to_the_ordering() {
        let query = SelectQuery::from("Order", "a").include(Include::new("a.Items")).order_by(Expr::col("a", "No"));
        let compiled = compile(&query);
        assert!(compiled.has_many);
        assert!(compiled.text.ends_with("ORDER BY t0.[No], t0.[Id]"));

        let config = CompilerConfig { enforce_root_order: false, ..CompilerConfig::default() };
        let (compiled, _) = compile_with(&SqlServer::new(), &config, &query).unwrap();
        assert!(compiled.text.ends_with("ORDER BY t0.[No]"));

        let unordered = compile(&SelectQuery::from("Order", "a").include(Include::new("a.Items")));
        assert!(unordered.text.ends_with("ORDER BY t0.[Id]"));
    }

    #[test]
    fn paging_a_to_many_select_pages_roots_only() {
        let query = SelectQuery::from("Order", "a")
            .include(Include::new("a.Items"))
            .order_by(Expr::col("a", "No"))
            .take(3);
        let compiled = compile(&query);
        assert_eq!(compiled.text, format!(
            "SELECT {}, t1.[OrderId] AS [NavigationSplitOn__], t1.[Id] AS [Id1], t1.[OrderId], t1.[Qty]\n\
             FROM (\n    SELECT TOP(3) {}\n    FROM [Orders] t0\n    ORDER BY t0.[No]\n) t0\n\
             LEFT JOIN [Items] t1 ON t0.[Id] = t1.[OrderId]\n\
             ORDER BY t0.[No], t0.[Id]",
            ORDER_COLUMNS, ORDER_COLUMNS
        ));
        assert!(compiled.has_many);
        assert_eq!(compiled.root_keys, vec![0]);
        assert_eq!(compiled.navigations.get("Items").map(|n| n.start), Some(4));
    }

    #[test]
    fn count_is_plain_or_wrapped() {
        let plain = SelectQuery::from("Order", "a").filter(Expr::col("a", "ClientId").eq(Expr::val(3))).count();
        let compiled = compile(&plain);
        assert_eq!(compiled.text, "SELECT COUNT(1)\nFROM [Orders] t0\nWHERE t0.[ClientId] = @p0");
        assert_eq!(compiled.columns.len(), 1);

        let distinct = SelectQuery::from("Order", "a").select(Projection::Scalar(Expr::col("a", "ClientId"))).distinct().count();
        assert_eq!(
            compile(&distinct).text,
            "SELECT COUNT(1)\nFROM (\n    SELECT DISTINCT t0.[ClientId] AS [ClientId]\n    FROM [Orders] t0\n) t0"
        );
    }

    #[test]
    fn aggregates_over_a_page_read_the_inner_column() {
        let query = SelectQuery::from("Order", "a")
            .order_by(Expr::col("a", "Id"))
            .take(10)
            .aggregate(AggregateCall::of(AggregateKind::Max, Expr::col("a", "Total")));
        assert_eq!(
            compile(&query).text,
            "SELECT MAX(t0.[Total])\nFROM (\n    SELECT TOP(10) t0.[Total] AS [Total]\n    FROM [Orders] t0\n    ORDER BY t0.[Id]\n) t0"
        );

        let bare = SelectQuery::from("Order", "a").aggregate(AggregateCall::bare(AggregateKind::Sum)).distinct();
        assert!(matches!(
            compile_with(&SqlServer::new(), &CompilerConfig::default(), &bare),
            Err(OrmError::Translation(TranslationError::ArgumentMismatch { .. }))
        ));
    }

    #[test]
    fn grouped_projection_with_having() {
        let query = SelectQuery::from("Item", "i")
            .group_by(GroupBy::single(Expr::col("i", "OrderId")))
            .having(Expr::aggregate(AggregateCall::count()).gt(Expr::val(1)))
            .select(Projection::Object(vec![
                Binding::expr("OrderId", Expr::key()),
                Binding::expr("Count", Expr::aggregate(AggregateCall::count())),
            ]));
        assert_eq!(
            compile(&query).text,
            "SELECT t0.[OrderId] AS [OrderId], COUNT(1) AS [Count]\nFROM [Items] t0\nGROUP BY t0.[OrderId]\nHAVING COUNT(1) > @p0"
        );
    }

    #[test]
    fn exists_is_wrapped_per_dialect() {
        let query = SelectQuery::from("Order", "a").filter(Expr::col("a", "ClientId").eq(Expr::val(3))).any();
        assert_eq!(
            compile(&query).text,
            "IF EXISTS(\n    SELECT TOP(1) 1\n    FROM [Orders] t0\n    WHERE t0.[ClientId] = @p0\n) SELECT 1 ELSE SELECT 0"
        );
        let (compiled, _) = compile_with(&Postgres::new(), &CompilerConfig::default(), &query).unwrap();
        assert_eq!(
            compiled.text,
            "SELECT CASE WHEN EXISTS(\n    SELECT 1\n    FROM \"Orders\" t0\n    WHERE t0.\"ClientId\" = @p0\n    LIMIT 1\n) THEN 1 ELSE 0 END"
        );
        assert_eq!(compiled.columns.get(0).map(|c| c.name.as_str()), Some("Exists"));
    }

    #[test]
    fn unions_concatenate_branches() {
        let query = SelectQuery::from("Order", "a")
            .filter(Expr::col("a", "ClientId").eq(Expr::val(1)))
            .union(SelectQuery::from("Order", "b").filter(Expr::col("b", "ClientId").eq(Expr::val(2))));
        let (compiled, params) = compile_with(&SqlServer::new(), &CompilerConfig::default(), &query).unwrap();
        assert_eq!(compiled.text, format!(
            "SELECT {cols}\nFROM [Orders] t0\nWHERE t0.[ClientId] = @p0\nUNION ALL\nSELECT {cols}\nFROM [Orders] t0\nWHERE t0.[ClientId] = @p1",
            cols = ORDER_COLUMNS
        ));
        assert_eq!(params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["@p0", "@p1"]);
    }

    #[test]
    fn malformed_unions_are_rejected() {
        let narrow = SelectQuery::from("Order", "a")
            .union(SelectQuery::from("Order", "b").select(Projection::Scalar(Expr::col("b", "Id"))));
        let with_many = SelectQuery::from("Order", "a")
            .include(Include::new("a.Items"))
            .union(SelectQuery::from("Order", "b"));
        for query in [narrow, with_many] {
            assert!(matches!(
                compile_with(&SqlServer::new(), &CompilerConfig::default(), &query),
                Err(OrmError::Translation(TranslationError::MalformedUnion(_)))
            ));
        }
    }

    #[test]
    fn in_subqueries_use_their_own_aliases() {
        let clients = SelectQuery::from("Client", "c")
            .filter(Expr::col("c", "Name").eq(Expr::val("x")))
            .select(Projection::Scalar(Expr::col("c", "Id")));
        let query = SelectQuery::from("Order", "a").filter(Expr::col("a", "ClientId").in_query(clients));
        let text = compile(&query).text;
        assert!(text.contains("WHERE t0.[ClientId] IN (\n    SELECT ts0.[Id] AS [Id]\n    FROM [Clients] ts0\n    WHERE ts0.[Name] = @p0\n)"));
    }

    #[test]
    fn oracle_pages_with_rownum() {
        let query = SelectQuery::from("Order", "a").order_by(Expr::col("a", "Id")).take(5);
        let (compiled, _) = compile_with(&Oracle::new(), &CompilerConfig::default(), &query).unwrap();
        assert!(compiled.text.starts_with("SELECT * FROM (\nSELECT t0.\"Id\""));
        assert!(compiled.text.contains("ORDER BY t0.\"Id\"\n) r0 WHERE ROWNUM <= 5"));
    }

    fn page_sits_inside_root_table(text: &str, page: &str) {
        let derived_end = text.find("\n) t0").expect("derived root table");
        assert_eq!(text.matches(page).count(), 1, "{}", text);
        assert!(text.find(page).unwrap() < derived_end, "{}", text);
        assert!(text.find("LEFT JOIN [Items]").or_else(|| text.find("LEFT JOIN \"Items\"")).unwrap() > derived_end, "{}", text);
    }

    #[test]
    fn sequence_members_cannot_filter_paged_or_counted_roots() {
        let filtered = SelectQuery::from("Order", "a")
            .filter(Expr::col("a", "Items.Qty").gt(Expr::val(1)))
            .order_by(Expr::col("a", "Id"));
        for query in [filtered.clone().take(3), filtered.count()] {
            assert!(matches!(
                compile_with(&SqlServer::new(), &CompilerConfig::default(), &query),
                Err(OrmError::Translation(TranslationError::Unsupported(_)))
            ));
        }
    }

    #[test]
    fn paged_sequences_reject_joined_sources_outside_the_page() {
        let joined = SelectQuery::from("Order", "a")
            .inner_join("Client", "c", Expr::col("a", "ClientId"), Expr::col("c", "Id"))
            .order_by(Expr::col("c", "Name"))
            .take(3);
        let projected = joined.clone().select(Projection::Object(vec![
            Binding::expr("Name", Expr::col("c", "Name")),
            Binding::expr("Id", Expr::col("a", "Id")),
            Binding::navigation("Items", "a.Items"),
        ]));
        let included = joined.include(Include::new("a.Items"));
        for query in [projected, included] {
            assert!(matches!(
                compile_with(&SqlServer::new(), &CompilerConfig::default(), &query),
                Err(OrmError::Translation(TranslationError::UnsupportedProjection(_)))
            ));
        }
    }

    #[test]
    fn paged_sequences_keep_filtering_joins_inside_the_page() {
        let query = SelectQuery::from("Order", "a")
            .inner_join("Client", "c", Expr::col("a", "ClientId"), Expr::col("c", "Id"))
            .filter(Expr::col("c", "Name").eq(Expr::val("x")))
            .include(Include::new("a.Items"))
            .order_by(Expr::col("a", "No"))
            .take(3);
        let compiled = compile(&query);
        page_sits_inside_root_table(&compiled.text, "TOP(3)");
        let derived_end = compiled.text.find("\n) t0").unwrap();
        assert!(compiled.text.find("INNER JOIN [Clients] t1 ON t0.[ClientId] = t1.[Id]").unwrap() < derived_end);
        assert!(compiled.text.find("WHERE t1.[Name] = @p0").unwrap() < derived_end);
        assert!(compiled.text.ends_with("ORDER BY t0.[No], t0.[Id]"));
    }

    #[test]
    fn paged_sequence_bindings_page_roots_only() {
        let query = SelectQuery::from("Order", "a")
            .select(Projection::Object(vec![
                Binding::expr("Id", Expr::col("a", "Id")),
                Binding::navigation("Items", "a.Items"),
            ]))
            .order_by(Expr::col("a", "Id"))
            .take(2);
        let compiled = compile(&query);
        assert!(compiled.has_many);
        assert_eq!(compiled.root_keys, vec![0]);
        page_sits_inside_root_table(&compiled.text, "TOP(2)");
        assert!(compiled.text.ends_with("ORDER BY t0.[Id]"));

        let (compiled, _) = compile_with(&Postgres::new(), &CompilerConfig::default(), &query.skip(4)).unwrap();
        page_sits_inside_root_table(&compiled.text, "LIMIT 2 OFFSET 4");
    }

    #[test]
    fn scalar_navigations_page_and_count_flat() {
        let query = SelectQuery::from("Order", "a")
            .filter(Expr::col("a", "Client.Name").eq(Expr::val("x")))
            .order_by(Expr::col("a", "Id"))
            .take(2);
        let compiled = compile(&query);
        assert!(!compiled.has_many);
        assert!(compiled.text.starts_with("SELECT TOP(2) "));
        assert!(compiled.text.contains("LEFT JOIN [Clients] t1 ON t0.[ClientId] = t1.[Id]"));

        let counted = SelectQuery::from("Order", "a").include(Include::new("a.Items")).count();
        assert_eq!(compile(&counted).text, "SELECT COUNT(1)\nFROM [Orders] t0");
    }
}
