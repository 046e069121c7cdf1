use crate::query::{Binding, Expr, MemberPath};

/// Eager load of a navigation chain. `pick` narrows the last entity's columns,
/// `predicate` filters it inside its own join condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub path: MemberPath,
    pub pick: Vec<Binding>,
    pub predicate: Option<Expr>,
}

impl Include {
    pub fn new(path: &str) -> Self {
        Self { path: MemberPath::parse(path), pick: Vec::new(), predicate: None }
    }

    pub fn pick(mut self, bindings: Vec<Binding>) -> Self {
        self.pick = bindings;
        self
    }

    /// Member paths in the predicate are written from the root label, e.g. `a.Items.Qty`.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }
}
