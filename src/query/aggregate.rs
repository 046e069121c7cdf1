use crate::query::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
            AggregateKind::Avg => "AVG",
        }
    }
}

/// `Count()`, `Max(a => a.Age)` and friends. Without an argument the aggregate
/// applies to the row (`COUNT`) or to the single projected column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub kind: AggregateKind,
    pub arg: Option<Box<Expr>>,
}

impl AggregateCall {
    pub fn count() -> Self {
        Self { kind: AggregateKind::Count, arg: None }
    }

    pub fn of(kind: AggregateKind, arg: Expr) -> Self {
        Self { kind, arg: Some(Box::new(arg)) }
    }

    pub fn bare(kind: AggregateKind) -> Self {
        Self { kind, arg: None }
    }
}
