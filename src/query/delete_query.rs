use serde_json::Value;

use crate::query::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Entity(Value),
    Filter(Option<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub entity: String,
    pub label: String,
    pub target: DeleteTarget,
}

impl DeleteQuery {
    pub fn entity(entity: &str, value: Value) -> Self {
        Self { entity: entity.to_string(), label: "a".to_string(), target: DeleteTarget::Entity(value) }
    }

    pub fn filter(entity: &str, label: &str, predicate: Expr) -> Self {
        Self { entity: entity.to_string(), label: label.to_string(), target: DeleteTarget::Filter(Some(predicate)) }
    }

    pub fn all(entity: &str, label: &str) -> Self {
        Self { entity: entity.to_string(), label: label.to_string(), target: DeleteTarget::Filter(None) }
    }
}
