use crate::query::Expr;

/// Grouping keys, named so projections can read them back through `Expr::GroupKey`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub keys: Vec<(String, Expr)>,
}

impl GroupBy {
    pub fn single(expr: Expr) -> Self {
        let name = expr.as_member().and_then(|p| p.last()).unwrap_or("Key").to_string();
        Self { keys: vec![(name, expr)] }
    }

    pub fn keys(keys: Vec<(&str, Expr)>) -> Self {
        Self { keys: keys.into_iter().map(|(n, e)| (n.to_string(), e)).collect() }
    }

    pub fn key(&self, name: Option<&str>) -> Option<&Expr> {
        match name {
            None if self.keys.len() == 1 => self.keys.first().map(|(_, e)| e),
            None => None,
            Some(n) => self.keys.iter().find(|(k, _)| k == n).map(|(_, e)| e),
        }
    }
}
