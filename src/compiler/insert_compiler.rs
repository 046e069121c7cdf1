use serde_json::Value;

use crate::{
    compiler::SelectCompiler,
    dialect::IdentityRetrieval,
    error::{OrmError, TranslationError},
    metadata::{ColumnMeta, EntityMeta},
    query::{InsertQuery, InsertSource, SelectQuery},
    translator::{AliasScope, TranslateContext},
    value::DbValue,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledInsert {
    pub text: String,
    /// Member patched with the generated id, when the statement retrieves one.
    pub identity: Option<String>,
}

pub struct InsertCompiler;

impl InsertCompiler {
    pub fn compile(ctx: &mut TranslateContext, query: &InsertQuery) -> Result<CompiledInsert, OrmError> {
        let metadata = ctx.metadata;
        let meta = metadata.require(&query.entity)?;
        match &query.source {
            InsertSource::Entity(value) => Self::single(ctx, meta, value),
            InsertSource::Bulk(rows) => Self::bulk(ctx, meta, rows),
            InsertSource::Select(select) => Self::from_select(ctx, meta, select),
        }
    }

    fn single(ctx: &mut TranslateContext, meta: &EntityMeta, value: &Value) -> Result<CompiledInsert, OrmError> {
        let columns = Self::insertable(meta)?;
        let values = Self::row_values(ctx, meta, &columns, value)?;
        let mut text = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            ctx.quote(&meta.table),
            Self::column_list(ctx, &columns),
            values.join(", ")
        );

        let Some(identity) = meta.identity() else {
            return Ok(CompiledInsert { text, identity: None });
        };
        match ctx.dialect.identity_retrieval(&meta.table, &identity.name) {
            IdentityRetrieval::Select(sql) => {
                text.push_str(ctx.dialect.statement_separator());
                text.push_str(&sql);
            }
            IdentityRetrieval::Returning { clause, parameter } => {
                text.push(' ');
                text.push_str(&clause);
                ctx.parameters.push_output(&parameter, identity.db_type);
            }
        }
        Ok(CompiledInsert { text, identity: Some(identity.member.clone()) })
    }

    /// Rows are split into statements of at most `bulk_batch_size` rows.
    fn bulk(ctx: &mut TranslateContext, meta: &EntityMeta, rows: &[Value]) -> Result<CompiledInsert, OrmError> {
        if rows.is_empty() {
            return Err(TranslationError::Unsupported(format!("bulk insert into '{}' without rows", meta.name)).into());
        }
        let columns = Self::insertable(meta)?;
        let table = ctx.quote(&meta.table);
        let column_list = Self::column_list(ctx, &columns);
        let batch = ctx.config.bulk_batch_size.max(1);

        let mut statements = Vec::new();
        for chunk in rows.chunks(batch) {
            let mut tuples = Vec::with_capacity(chunk.len());
            for row in chunk {
                tuples.push(format!("({})", Self::row_values(ctx, meta, &columns, row)?.join(", ")));
            }
            let statement = if ctx.dialect.multi_row_insert() {
                format!("INSERT INTO {} ({}) VALUES\n{}", table, column_list, tuples.join(",\n"))
            } else {
                let into: Vec<String> = tuples.iter()
                    .map(|tuple| format!("INTO {} ({}) VALUES {}", table, column_list, tuple))
                    .collect();
                format!("INSERT ALL\n{}\nSELECT 1 FROM {}", into.join("\n"), ctx.dialect.dummy_from().unwrap_or("DUAL"))
            };
            statements.push(statement);
        }
        Ok(CompiledInsert { text: statements.join(ctx.dialect.statement_separator()), identity: None })
    }

    /// Projected names must be members of the target entity.
    fn from_select(ctx: &mut TranslateContext, meta: &EntityMeta, select: &SelectQuery) -> Result<CompiledInsert, OrmError> {
        let compiled = SelectCompiler::compile(ctx, select, AliasScope::new(), 0, false)?;
        if !compiled.navigations.is_empty() {
            return Err(TranslationError::UnsupportedProjection("an inserted select cannot load navigations".into()).into());
        }
        let mut targets = Vec::with_capacity(compiled.columns.len());
        for descriptor in compiled.columns.iter() {
            let column = meta.get_column(&descriptor.name)
                .filter(|c| c.is_mapped)
                .ok_or_else(|| TranslationError::UnsupportedMember { entity: meta.name.clone(), member: descriptor.name.clone() })?;
            targets.push(ctx.quote(&column.name));
        }
        let text = format!("INSERT INTO {} ({})\n{}", ctx.quote(&meta.table), targets.join(", "), compiled.text);
        Ok(CompiledInsert { text, identity: None })
    }

    fn insertable(meta: &EntityMeta) -> Result<Vec<&ColumnMeta>, OrmError> {
        let columns: Vec<&ColumnMeta> = meta.mapped_columns().filter(|c| !c.is_identity).collect();
        if columns.is_empty() {
            return Err(TranslationError::Unsupported(format!("entity '{}' has no insertable column", meta.name)).into());
        }
        Ok(columns)
    }

    fn column_list(ctx: &TranslateContext, columns: &[&ColumnMeta]) -> String {
        columns.iter().map(|c| ctx.quote(&c.name)).collect::<Vec<_>>().join(", ")
    }

    /// Absent members are written as NULL.
    pub(crate) fn row_values(
        ctx: &mut TranslateContext,
        meta: &EntityMeta,
        columns: &[&ColumnMeta],
        value: &Value,
    ) -> Result<Vec<String>, OrmError> {
        let Value::Object(object) = value else {
            return Err(TranslationError::InvalidValue { member: meta.name.clone(), reason: format!("{} is not an object", value) }.into());
        };
        let mut values = Vec::with_capacity(columns.len());
        for column in columns.iter().copied() {
            let raw = object.get(&column.member).unwrap_or(&Value::Null);
            let db_value = DbValue::from_json(raw, Some(column.db_type)).map_err(|reason| TranslationError::InvalidValue {
                member: format!("{}.{}", meta.name, column.member),
                reason,
            })?;
            values.push(ctx.constant(db_value, Some(column)));
        }
        Ok(values)
    }
}
