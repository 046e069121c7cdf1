use crate::{
    compiler::UpdateCompiler,
    dialect::DmlStyle,
    error::{OrmError, TranslationError},
    metadata::ColumnMeta,
    query::{DeleteQuery, DeleteTarget},
    translator::{AliasScope, ExpressionTranslator, NavigationResolver, SqlWriter, TranslateContext},
};

pub struct DeleteCompiler;

impl DeleteCompiler {
    pub fn compile(ctx: &mut TranslateContext, query: &DeleteQuery) -> Result<String, OrmError> {
        let metadata = ctx.metadata;
        let meta = metadata.require(&query.entity)?;

        let mut scope = AliasScope::new();
        let alias = scope.bind_source(&query.label, Some(&meta.name), None)?;
        let mut navigations = NavigationResolver::new();

        let filter = match &query.target {
            DeleteTarget::Entity(value) => {
                let keys: Vec<&ColumnMeta> = meta.keys().collect();
                if keys.is_empty() {
                    return Err(TranslationError::MissingKeyColumn { entity: meta.name.clone(), operation: "Delete".into() }.into());
                }
                Some(UpdateCompiler::key_filter(ctx, meta, &alias, &keys, value)?)
            }
            DeleteTarget::Filter(Some(predicate)) => {
                let mut et = ExpressionTranslator::new(ctx, &mut scope, &mut navigations, 0);
                Some(et.translate_predicate(predicate)?)
            }
            DeleteTarget::Filter(None) => None,
        };

        let joins = navigations.emit(ctx)?;
        let table = ctx.quote(&meta.table);
        let mut w = SqlWriter::new(String::new());
        match ctx.dialect.dml_style() {
            DmlStyle::UpdateFrom | DmlStyle::UpdateJoin => {
                w.line(&format!("DELETE {}", alias));
                w.line(&format!("FROM {} {}", table, alias));
                w.lines(&joins);
            }
            DmlStyle::Standard => {
                UpdateCompiler::reject_joins(ctx, &joins, "DELETE")?;
                w.line(&format!("DELETE FROM {}", ctx.dialect.table_alias(&table, &alias)));
            }
        }
        if let Some(filter) = filter {
            w.line(&format!("WHERE {}", filter));
        }
        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::CompilerConfig,
        dialect::{Dialect, MySql, Oracle, Sqlite, SqlServer},
        metadata::{DbType, EntityMeta, ForeignKey, MetadataRegistry, NavigationMeta},
        query::Expr,
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Item", "Items")
                .column(ColumnMeta::key("OrderId", DbType::Int))
                .column(ColumnMeta::key("Line", DbType::Int))
                .column(ColumnMeta::new("Qty", DbType::Int))
                .navigation(NavigationMeta::one("Order", "Order", ForeignKey::single("OrderId", "Id"))))
            .unwrap()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("Closed", DbType::Bool)))
            .unwrap()
            .with(EntityMeta::new("Log", "Logs").column(ColumnMeta::new("Line", DbType::String)))
            .unwrap()
    }

    fn compile_with(dialect: &dyn Dialect, query: &DeleteQuery) -> Result<String, OrmError> {
        let reg = registry();
        let config = CompilerConfig::inline();
        let mut ctx = TranslateContext::new(dialect, &reg, &config);
        DeleteCompiler::compile(&mut ctx, query)
    }

    #[test]
    fn entity_delete_matches_every_key() {
        let query = DeleteQuery::entity("Item", json!({ "OrderId": 4, "Line": 2, "Qty": 9 }));
        assert_eq!(
            compile_with(&SqlServer::new(), &query).unwrap(),
            "DELETE t0\nFROM [Items] t0\nWHERE t0.[OrderId] = 4 AND t0.[Line] = 2"
        );
        assert_eq!(
            compile_with(&Oracle::new(), &query).unwrap(),
            "DELETE FROM \"Items\" t0\nWHERE t0.\"OrderId\" = 4 AND t0.\"Line\" = 2"
        );
        assert_eq!(
            compile_with(&Sqlite::new(), &query).unwrap(),
            "DELETE FROM \"Items\" AS t0\nWHERE t0.\"OrderId\" = 4 AND t0.\"Line\" = 2"
        );
    }

    #[test]
    fn filtered_delete_joins_navigations() {
        let query = DeleteQuery::filter("Item", "i", Expr::col("i", "Order.Closed"));
        assert_eq!(
            compile_with(&MySql::new(), &query).unwrap(),
            "DELETE t0\nFROM `Items` t0\nLEFT JOIN `Orders` t1 ON t0.`OrderId` = t1.`Id`\nWHERE t1.`Closed` = TRUE"
        );
        assert!(compile_with(&Oracle::new(), &query).is_err());
        assert_eq!(compile_with(&SqlServer::new(), &DeleteQuery::all("Log", "l")).unwrap(), "DELETE t0\nFROM [Logs] t0");
    }

    #[test]
    fn entity_delete_without_key_fails() {
        let err = compile_with(&SqlServer::new(), &DeleteQuery::entity("Log", json!({ "Line": "x" }))).unwrap_err();
        assert_eq!(err, OrmError::Translation(TranslationError::MissingKeyColumn { entity: "Log".into(), operation: "Delete".into() }));
    }
}
