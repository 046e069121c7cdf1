use serde_json::Value;

use crate::query::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateTarget {
    /// Every mapped non-key member, matched on the entity's key.
    Entity(Value),
    Assign { assignments: Vec<(String, Expr)>, filter: Option<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub entity: String,
    pub label: String,
    pub target: UpdateTarget,
}

impl UpdateQuery {
    pub fn entity(entity: &str, value: Value) -> Self {
        Self { entity: entity.to_string(), label: "a".to_string(), target: UpdateTarget::Entity(value) }
    }

    pub fn set(entity: &str, label: &str) -> Self {
        Self {
            entity: entity.to_string(),
            label: label.to_string(),
            target: UpdateTarget::Assign { assignments: Vec::new(), filter: None },
        }
    }

    pub fn assign(mut self, member: &str, value: Expr) -> Self {
        if let UpdateTarget::Assign { assignments, .. } = &mut self.target {
            assignments.push((member.to_string(), value));
        }
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        if let UpdateTarget::Assign { filter, .. } = &mut self.target {
            *filter = Some(match filter.take() {
                Some(existing) => existing.and(predicate),
                None => predicate,
            });
        }
        self
    }
}
