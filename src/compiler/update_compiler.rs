use serde_json::Value;

use crate::{
    compiler::InsertCompiler,
    dialect::DmlStyle,
    error::{OrmError, TranslationError},
    metadata::{ColumnMeta, EntityMeta},
    query::{UpdateQuery, UpdateTarget},
    translator::{AliasScope, ExpressionTranslator, NavigationResolver, SqlWriter, TranslateContext},
    value::DbValue,
};

pub struct UpdateCompiler;

impl UpdateCompiler {
    pub fn compile(ctx: &mut TranslateContext, query: &UpdateQuery) -> Result<String, OrmError> {
        let metadata = ctx.metadata;
        let meta = metadata.require(&query.entity)?;
        let style = ctx.dialect.dml_style();
        let qualified = style != DmlStyle::Standard;

        let mut scope = AliasScope::new();
        let alias = scope.bind_source(&query.label, Some(&meta.name), None)?;
        let mut navigations = NavigationResolver::new();

        let (sets, filter) = match &query.target {
            UpdateTarget::Entity(value) => {
                let keys: Vec<&ColumnMeta> = meta.keys().collect();
                if keys.is_empty() {
                    return Err(TranslationError::MissingKeyColumn { entity: meta.name.clone(), operation: "Update".into() }.into());
                }
                let columns: Vec<&ColumnMeta> = meta.mapped_columns().filter(|c| !c.is_key).collect();
                if columns.is_empty() {
                    return Err(TranslationError::Unsupported(format!("entity '{}' has no column besides its key", meta.name)).into());
                }
                let values = InsertCompiler::row_values(ctx, meta, &columns, value)?;
                let sets: Vec<String> = columns.iter()
                    .zip(values)
                    .map(|(column, value)| format!("{} = {}", Self::target(ctx, &alias, column, qualified), value))
                    .collect();
                let filter = Self::key_filter(ctx, meta, &alias, &keys, value)?;
                (sets, Some(filter))
            }
            UpdateTarget::Assign { assignments, filter } => {
                if assignments.is_empty() {
                    return Err(TranslationError::Unsupported(format!("update of '{}' assigns nothing", meta.name)).into());
                }
                let mut et = ExpressionTranslator::new(ctx, &mut scope, &mut navigations, 0);
                let mut sets = Vec::with_capacity(assignments.len());
                for (member, expr) in assignments {
                    let column = meta.get_column(member)
                        .filter(|c| c.is_mapped)
                        .ok_or_else(|| TranslationError::UnsupportedMember { entity: meta.name.clone(), member: member.clone() })?;
                    let value = et.translate_with_hint(expr, Some(column))?;
                    sets.push(format!("{} = {}", Self::target(et.ctx, &alias, column, qualified), value));
                }
                let filter = match filter {
                    Some(predicate) => Some(et.translate_predicate(predicate)?),
                    None => None,
                };
                (sets, filter)
            }
        };

        let joins = navigations.emit(ctx)?;
        let table = ctx.quote(&meta.table);
        let mut w = SqlWriter::new(String::new());
        match style {
            DmlStyle::UpdateFrom => {
                w.line(&format!("UPDATE {}", alias));
                w.line(&format!("SET {}", sets.join(", ")));
                w.line(&format!("FROM {} {}", table, alias));
                w.lines(&joins);
            }
            DmlStyle::UpdateJoin => {
                w.line(&format!("UPDATE {} {}", table, alias));
                w.lines(&joins);
                w.line(&format!("SET {}", sets.join(", ")));
            }
            DmlStyle::Standard => {
                Self::reject_joins(ctx, &joins, "UPDATE")?;
                w.line(&format!("UPDATE {}", ctx.dialect.table_alias(&table, &alias)));
                w.line(&format!("SET {}", sets.join(", ")));
            }
        }
        if let Some(filter) = filter {
            w.line(&format!("WHERE {}", filter));
        }
        Ok(w.finish())
    }

    fn target(ctx: &TranslateContext, alias: &str, column: &ColumnMeta, qualified: bool) -> String {
        if qualified { ctx.qualify(alias, &column.name) } else { ctx.quote(&column.name) }
    }

    pub(crate) fn reject_joins(ctx: &TranslateContext, joins: &[String], statement: &str) -> Result<(), OrmError> {
        if joins.is_empty() {
            return Ok(());
        }
        Err(TranslationError::Unsupported(format!(
            "{} on {} cannot join navigations", statement, ctx.dialect.name()
        )).into())
    }

    /// `alias.key = value AND ..`; every key member must carry a value.
    pub(crate) fn key_filter(
        ctx: &mut TranslateContext,
        meta: &EntityMeta,
        alias: &str,
        keys: &[&ColumnMeta],
        value: &Value,
    ) -> Result<String, OrmError> {
        let mut terms = Vec::with_capacity(keys.len());
        for key in keys.iter().copied() {
            let member = format!("{}.{}", meta.name, key.member);
            let raw = value.get(&key.member).filter(|v| !v.is_null()).ok_or_else(|| TranslationError::InvalidValue {
                member: member.clone(),
                reason: "a key value is required".into(),
            })?;
            let db_value = DbValue::from_json(raw, Some(key.db_type))
                .map_err(|reason| TranslationError::InvalidValue { member, reason })?;
            let sql = ctx.constant(db_value, Some(key));
            terms.push(format!("{} = {}", ctx.qualify(alias, &key.name), sql));
        }
        Ok(terms.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::CompilerConfig,
        dialect::{Dialect, MySql, Postgres, SqlServer},
        metadata::{DbType, ForeignKey, MetadataRegistry, NavigationMeta},
        query::Expr,
        translator::Parameter,
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("User", "Users")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("Name", DbType::String))
                .column(ColumnMeta::new("Age", DbType::Int))
                .column(ColumnMeta::new("CityId", DbType::Int))
                .navigation(NavigationMeta::one("City", "City", ForeignKey::single("CityId", "Id"))))
            .unwrap()
            .with(EntityMeta::new("City", "Cities")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("Name", DbType::String)))
            .unwrap()
            .with(EntityMeta::new("Log", "Logs").column(ColumnMeta::new("Line", DbType::String)))
            .unwrap()
    }

    fn compile_with(dialect: &dyn Dialect, query: &UpdateQuery) -> Result<(String, Vec<Parameter>), OrmError> {
        let reg = registry();
        let config = CompilerConfig::default();
        let mut ctx = TranslateContext::new(dialect, &reg, &config);
        let text = UpdateCompiler::compile(&mut ctx, query)?;
        Ok((text, ctx.parameters.into_vec()))
    }

    fn user() -> Value {
        json!({ "Id": 7, "Name": "ann", "Age": 31, "CityId": 2 })
    }

    #[test]
    fn entity_update_per_style() {
        let query = UpdateQuery::entity("User", user());
        let (text, params) = compile_with(&SqlServer::new(), &query).unwrap();
        assert_eq!(text, "UPDATE t0\nSET t0.[Name] = @p0, t0.[Age] = @p1, t0.[CityId] = @p2\nFROM [Users] t0\nWHERE t0.[Id] = @p3");
        assert_eq!(params[3].value, DbValue::Int(7));

        let (text, _) = compile_with(&MySql::new(), &query).unwrap();
        assert_eq!(text, "UPDATE `Users` t0\nSET t0.`Name` = ?p0, t0.`Age` = ?p1, t0.`CityId` = ?p2\nWHERE t0.`Id` = ?p3");

        let (text, _) = compile_with(&Postgres::new(), &query).unwrap();
        assert_eq!(text, "UPDATE \"Users\" t0\nSET \"Name\" = @p0, \"Age\" = @p1, \"CityId\" = @p2\nWHERE t0.\"Id\" = @p3");
    }

    #[test]
    fn entity_update_needs_a_key_and_its_value() {
        let err = compile_with(&SqlServer::new(), &UpdateQuery::entity("Log", json!({ "Line": "x" }))).unwrap_err();
        assert!(matches!(err, OrmError::Translation(TranslationError::MissingKeyColumn { ref operation, .. }) if operation == "Update"));

        let err = compile_with(&SqlServer::new(), &UpdateQuery::entity("User", json!({ "Name": "ann" }))).unwrap_err();
        assert!(matches!(err, OrmError::Translation(TranslationError::InvalidValue { ref member, .. }) if member == "User.Id"));
    }

    #[test]
    fn assignments_join_navigations_where_the_dialect_allows() {
        let query = UpdateQuery::set("User", "u")
            .assign("Age", Expr::binary(crate::query::BinaryOp::Add, Expr::col("u", "Age"), Expr::val(1)))
            .filter(Expr::col("u", "City.Name").eq(Expr::val("Oslo")));
        let (text, params) = compile_with(&SqlServer::new(), &query).unwrap();
        assert_eq!(
            text,
            "UPDATE t0\nSET t0.[Age] = (t0.[Age] + @p0)\nFROM [Users] t0\nLEFT JOIN [Cities] t1 ON t0.[CityId] = t1.[Id]\nWHERE t1.[Name] = @p1"
        );
        assert_eq!(params.len(), 2);

        let (text, _) = compile_with(&MySql::new(), &query).unwrap();
        assert!(text.starts_with("UPDATE `Users` t0\nLEFT JOIN `Cities` t1 ON t0.`CityId` = t1.`Id`\nSET t0.`Age`"));

        assert!(matches!(
            compile_with(&Postgres::new(), &query),
            Err(OrmError::Translation(TranslationError::Unsupported(_)))
        ));
    }

    #[test]
    fn unknown_or_missing_assignments_fail() {
        let unknown = UpdateQuery::set("User", "u").assign("Nope", Expr::val(1));
        assert!(matches!(
            compile_with(&SqlServer::new(), &unknown),
            Err(OrmError::Translation(TranslationError::UnsupportedMember { .. }))
        ));
        assert!(compile_with(&SqlServer::new(), &UpdateQuery::set("User", "u")).is_err());
    }
}
