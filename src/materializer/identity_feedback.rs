use serde_json::Value;
use tracing::debug;

use crate::{
    compiler::Command,
    dialect::IDENTITY_COLUMN,
    error::MaterializationError,
    materializer::{RowCursor, ValueConverter},
    metadata::DbType,
    translator::{Parameter, ParameterDirection},
    value::DbValue,
};

/// Carries database-generated identities back into the values that were inserted.
pub struct IdentityFeedback;

impl IdentityFeedback {
    /// Identities returned as rows, read from the identity column or else the first one.
    pub fn collect<C: RowCursor>(mut cursor: C) -> Result<Vec<DbValue>, MaterializationError> {
        let index = (0..cursor.field_count())
            .find(|i| cursor.name_at(*i).map(|n| n.eq_ignore_ascii_case(IDENTITY_COLUMN)).unwrap_or(false))
            .unwrap_or(0);
        let mut ids = Vec::new();
        while cursor.move_next()? {
            if !cursor.is_null(index) {
                ids.push(cursor.get_value(index)?);
            }
        }
        Ok(ids)
    }

    /// Identities returned through output parameters, after execution filled them in.
    pub fn from_parameters(parameters: &[Parameter]) -> Vec<DbValue> {
        parameters.iter()
            .filter(|p| p.direction == ParameterDirection::Output && !p.value.is_null())
            .map(|p| p.value.clone())
            .collect()
    }

    /// Writes `ids` into the identity member of `entities`, in order. Returns how many were patched.
    pub fn apply(command: &Command, ids: &[DbValue], entities: &mut [Value]) -> Result<usize, MaterializationError> {
        let Some(member) = command.identity_member() else {
            return Ok(0);
        };
        if ids.len() != entities.len() {
            return Err(MaterializationError::IdentityCount { ids: ids.len(), entities: entities.len() });
        }
        for (id, entity) in ids.iter().zip(entities.iter_mut()) {
            let value = ValueConverter::convert(id.clone(), Some(DbType::Int), IDENTITY_COLUMN)?;
            match entity.as_object_mut() {
                Some(object) => {
                    object.insert(member.to_string(), value);
                }
                None => return Err(MaterializationError::Deserialize {
                    target: command.entity().unwrap_or("entity").to_string(),
                    message: "inserted value is not an object".into(),
                }),
            }
        }
        debug!(target: "ormql::materializer", member, patched = ids.len(), "applied generated identities");
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        compiler::QueryCompiler,
        dialect::{Oracle, SqlServer},
        materializer::MemoryCursor,
        metadata::{ColumnMeta, EntityMeta, MetadataRegistry},
        query::InsertQuery,
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("No", DbType::String)))
            .unwrap()
    }

    #[test]
    fn identity_rows_patch_the_inserted_entity() {
        let reg = registry();
        let mut order = json!({ "No": "A-1" });
        let command = QueryCompiler::new(Arc::new(SqlServer::new()), &reg)
            .compile_insert(&InsertQuery::entity("Order", order.clone()))
            .unwrap();
        assert!(command.text().contains(IDENTITY_COLUMN));

        let cursor = MemoryCursor::from_json([IDENTITY_COLUMN], &[json!(["42"])]).unwrap();
        let ids = IdentityFeedback::collect(cursor).unwrap();
        let patched = IdentityFeedback::apply(&command, &ids, std::slice::from_mut(&mut order)).unwrap();
        assert_eq!(patched, 1);
        assert_eq!(order, json!({ "Id": 42, "No": "A-1" }));
    }

    #[test]
    fn output_parameters_feed_identities() {
        let reg = registry();
        let command = QueryCompiler::new(Arc::new(Oracle::new()), &reg)
            .compile_insert(&InsertQuery::entity("Order", json!({ "No": "A-1" })))
            .unwrap();
        let mut parameters = command.parameters().to_vec();
        assert!(IdentityFeedback::from_parameters(&parameters).is_empty());
        for p in parameters.iter_mut().filter(|p| p.direction == ParameterDirection::Output) {
            p.value = DbValue::Int(7);
        }
        let ids = IdentityFeedback::from_parameters(&parameters);
        let mut rows = vec![json!({ "No": "A-1" })];
        IdentityFeedback::apply(&command, &ids, &mut rows).unwrap();
        assert_eq!(rows[0]["Id"], json!(7));
    }

    #[test]
    fn count_mismatch_is_reported() {
        let reg = registry();
        let command = QueryCompiler::new(Arc::new(SqlServer::new()), &reg)
            .compile_insert(&InsertQuery::entity("Order", json!({ "No": "A-1" })))
            .unwrap();
        let mut rows = vec![json!({}), json!({})];
        let err = IdentityFeedback::apply(&command, &[DbValue::Int(1)], &mut rows).unwrap_err();
        assert_eq!(err, MaterializationError::IdentityCount { ids: 1, entities: 2 });
        assert_eq!(err.to_string(), "1 generated identity value(s) for 2 inserted entit(ies)");
    }
}
