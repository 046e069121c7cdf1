use crate::query::{Expr, MemberPath};

/// Shape of a select result.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Every mapped member of the labelled source.
    Entity(String),
    /// One expression; a navigation member selects that whole entity.
    Scalar(Expr),
    /// `new { .. }` with named bindings.
    Object(Vec<Binding>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    Expr(Expr),
    /// A navigation of a source, joined and hydrated as a sub-entity.
    Navigation(MemberPath),
    /// Every member of another joined source.
    Source(String),
    Object(Vec<Binding>),
}

impl Binding {
    pub fn expr(name: &str, expr: Expr) -> Self {
        Self { name: name.to_string(), value: BindingValue::Expr(expr) }
    }

    pub fn navigation(name: &str, path: &str) -> Self {
        Self { name: name.to_string(), value: BindingValue::Navigation(MemberPath::parse(path)) }
    }

    pub fn source(name: &str, label: &str) -> Self {
        Self { name: name.to_string(), value: BindingValue::Source(label.to_string()) }
    }

    pub fn object(name: &str, bindings: Vec<Binding>) -> Self {
        Self { name: name.to_string(), value: BindingValue::Object(bindings) }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, BindingValue::Expr(_))
    }

    pub fn references(&self, label: &str) -> bool {
        match &self.value {
            BindingValue::Expr(expr) => expr.references(label),
            BindingValue::Navigation(path) => path.source == label,
            BindingValue::Source(source) => source == label,
            BindingValue::Object(inner) => inner.iter().any(|b| b.references(label)),
        }
    }
}

impl Projection {
    pub fn references(&self, label: &str) -> bool {
        match self {
            Projection::Entity(source) => source == label,
            Projection::Scalar(expr) => expr.references(label),
            Projection::Object(bindings) => bindings.iter().any(|b| b.references(label)),
        }
    }
}
