use crate::query::{Expr, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

/// Explicit join of another source; `on` holds equality pairs (outer side, joined side).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: Source,
    pub label: String,
    pub on: Vec<(Expr, Expr)>,
}

impl JoinClause {
    pub fn new(kind: JoinKind, entity: &str, label: &str, on: Vec<(Expr, Expr)>) -> Self {
        Self { kind, source: Source::Table(entity.to_string()), label: label.to_string(), on }
    }

    pub fn cross(entity: &str, label: &str) -> Self {
        Self::new(JoinKind::Cross, entity, label, Vec::new())
    }
}
