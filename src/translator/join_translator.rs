use crate::{
    compiler::SelectCompiler,
    error::{OrmError, TranslationError},
    query::{JoinClause, JoinKind, Source},
    translator::{AliasScope, ExpressionTranslator, TranslateContext},
};

/// A FROM or JOIN source bound to its alias, rendered as `<table> <alias>`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSource {
    pub sql: String,
    pub alias: String,
}

pub struct JoinTranslator;

impl JoinTranslator {
    /// Binds `label` in `scope`. Subquery sources are compiled here, one level deeper and
    /// with their own scope, so their parameters precede the outer ones.
    pub fn bind(
        ctx: &mut TranslateContext,
        scope: &mut AliasScope,
        source: &Source,
        label: &str,
        depth: usize,
    ) -> Result<BoundSource, OrmError> {
        match source {
            Source::Table(entity) => {
                let meta = ctx.metadata.require(entity)?;
                let alias = scope.bind_source(label, Some(entity), None)?;
                let mut sql = format!("{} {}", ctx.quote(&meta.table), alias);
                if let Some(hint) = ctx.dialect.table_hint(ctx.config) {
                    sql.push(' ');
                    sql.push_str(hint);
                }
                Ok(BoundSource { sql, alias })
            }
            Source::Subquery(inner) => {
                let nested = SelectCompiler::compile(ctx, inner, AliasScope::new(), depth + 1, true)?;
                if !nested.navigations.is_empty() {
                    return Err(TranslationError::UnsupportedProjection(format!(
                        "derived source '{}' cannot load navigations", label
                    )).into());
                }
                let alias = scope.bind_source(label, nested.entity.as_deref(), Some(nested.columns.aliases()))?;
                Ok(BoundSource { sql: format!("(\n{}\n{}) {}", nested.text, ctx.pad(depth), alias), alias })
            }
        }
    }

    pub fn translate(et: &mut ExpressionTranslator, join: &JoinClause, bound: &BoundSource) -> Result<String, OrmError> {
        let keyword = et.ctx.dialect.join_keyword(join.kind);
        if join.kind == JoinKind::Cross {
            return Ok(format!("{} {}", keyword, bound.sql));
        }
        if join.on.is_empty() {
            return Err(TranslationError::Unsupported(format!("join of '{}' has no condition", join.label)).into());
        }
        let mut conditions = Vec::with_capacity(join.on.len());
        for (outer, inner) in &join.on {
            conditions.push(et.translate_predicate(&outer.clone().eq(inner.clone()))?);
        }
        Ok(format!("{} {} ON {}", keyword, bound.sql, conditions.join(" AND ")))
    }
}
