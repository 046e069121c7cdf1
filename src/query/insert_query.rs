use serde::Serialize;
use serde_json::Value;

use crate::{error::TranslationError, query::SelectQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Entity(Value),
    Bulk(Vec<Value>),
    Select(Box<SelectQuery>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub entity: String,
    pub source: InsertSource,
}

impl InsertQuery {
    pub fn entity(entity: &str, value: Value) -> Self {
        Self { entity: entity.to_string(), source: InsertSource::Entity(value) }
    }

    pub fn from_serialize<T: Serialize>(entity: &str, value: &T) -> Result<Self, TranslationError> {
        let value = serde_json::to_value(value).map_err(|e| TranslationError::InvalidValue {
            member: entity.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::entity(entity, value))
    }

    pub fn bulk(entity: &str, rows: Vec<Value>) -> Self {
        Self { entity: entity.to_string(), source: InsertSource::Bulk(rows) }
    }

    /// `INSERT INTO .. SELECT ..`; projected column names must match entity members.
    pub fn from_select(entity: &str, query: SelectQuery) -> Self {
        Self { entity: entity.to_string(), source: InsertSource::Select(Box::new(query)) }
    }
}
