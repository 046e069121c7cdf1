use crate::query::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, descending: false }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, descending: true }
    }
}
