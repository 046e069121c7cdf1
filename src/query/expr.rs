use crate::{query::{AggregateCall, BinaryOp, MemberPath, SelectQuery, UnaryOp}, value::DbValue};

/// Expression tree handed to the compiler. Instance methods are `Call`s whose
/// first argument is the receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(DbValue),
    Member(MemberPath),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Coalesce { left: Box<Expr>, right: Box<Expr> },
    Conditional { test: Box<Expr>, if_true: Box<Expr>, if_false: Box<Expr> },
    Call { method: String, args: Vec<Expr> },
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    InQuery { expr: Box<Expr>, query: Box<SelectQuery>, negated: bool },
    Aggregate(AggregateCall),
    /// `g.Key` (None) or `g.Key.Name` inside a grouped query.
    GroupKey(Option<String>),
}

impl Expr {
    pub fn col(source: &str, members: &str) -> Self {
        Expr::Member(MemberPath::new(source, members))
    }

    pub fn val<V: Into<DbValue>>(value: V) -> Self {
        Expr::Constant(value.into())
    }

    pub fn null() -> Self {
        Expr::Constant(DbValue::Null)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn call(method: &str, args: Vec<Expr>) -> Self {
        Expr::Call { method: method.to_string(), args }
    }

    pub fn eq(self, other: Expr) -> Self { Self::binary(BinaryOp::Eq, self, other) }
    pub fn ne(self, other: Expr) -> Self { Self::binary(BinaryOp::Ne, self, other) }
    pub fn lt(self, other: Expr) -> Self { Self::binary(BinaryOp::Lt, self, other) }
    pub fn le(self, other: Expr) -> Self { Self::binary(BinaryOp::Le, self, other) }
    pub fn gt(self, other: Expr) -> Self { Self::binary(BinaryOp::Gt, self, other) }
    pub fn ge(self, other: Expr) -> Self { Self::binary(BinaryOp::Ge, self, other) }
    pub fn and(self, other: Expr) -> Self { Self::binary(BinaryOp::And, self, other) }
    pub fn or(self, other: Expr) -> Self { Self::binary(BinaryOp::Or, self, other) }
    pub fn concat(self, other: Expr) -> Self { Self::binary(BinaryOp::Concat, self, other) }

    pub fn not(self) -> Self {
        Expr::Unary { op: UnaryOp::Not, operand: Box::new(self) }
    }

    pub fn negate(self) -> Self {
        Expr::Unary { op: UnaryOp::Negate, operand: Box::new(self) }
    }

    pub fn coalesce(self, other: Expr) -> Self {
        Expr::Coalesce { left: Box::new(self), right: Box::new(other) }
    }

    pub fn when(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Conditional { test: Box::new(test), if_true: Box::new(if_true), if_false: Box::new(if_false) }
    }

    /// Instance method call, `self` becomes the receiver.
    pub fn method(self, method: &str, args: Vec<Expr>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(self);
        all.extend(args);
        Expr::Call { method: method.to_string(), args: all }
    }

    pub fn in_list(self, list: Vec<Expr>) -> Self {
        Expr::InList { expr: Box::new(self), list, negated: false }
    }

    pub fn in_query(self, query: SelectQuery) -> Self {
        Expr::InQuery { expr: Box::new(self), query: Box::new(query), negated: false }
    }

    pub fn aggregate(call: AggregateCall) -> Self {
        Expr::Aggregate(call)
    }

    pub fn key() -> Self {
        Expr::GroupKey(None)
    }

    pub fn key_member(name: &str) -> Self {
        Expr::GroupKey(Some(name.to_string()))
    }

    /// True when the subtree references no source, so it can be evaluated before translation.
    pub fn is_closed(&self) -> bool {
        match self {
            Expr::Constant(_) => true,
            Expr::Binary { left, right, .. } | Expr::Coalesce { left, right } => left.is_closed() && right.is_closed(),
            Expr::Unary { operand, .. } => operand.is_closed(),
            Expr::Conditional { test, if_true, if_false } =>
                test.is_closed() && if_true.is_closed() && if_false.is_closed(),
            Expr::InList { expr, list, .. } => expr.is_closed() && list.iter().all(Expr::is_closed),
            Expr::Member(_) | Expr::Call { .. } | Expr::InQuery { .. } | Expr::Aggregate(_) | Expr::GroupKey(_) => false,
        }
    }

    /// Whether some member path of the subtree starts at `label`. Subqueries are not searched,
    /// they are compiled in a scope of their own.
    pub fn references(&self, label: &str) -> bool {
        match self {
            Expr::Member(path) => path.source == label,
            Expr::Binary { left, right, .. } | Expr::Coalesce { left, right } =>
                left.references(label) || right.references(label),
            Expr::Unary { operand, .. } => operand.references(label),
            Expr::Conditional { test, if_true, if_false } =>
                test.references(label) || if_true.references(label) || if_false.references(label),
            Expr::Call { args, .. } => args.iter().any(|a| a.references(label)),
            Expr::InList { expr, list, .. } => expr.references(label) || list.iter().any(|e| e.references(label)),
            Expr::InQuery { expr, .. } => expr.references(label),
            Expr::Aggregate(call) => call.arg.as_ref().map(|a| a.references(label)).unwrap_or(false),
            Expr::Constant(_) | Expr::GroupKey(_) => false,
        }
    }

    pub fn as_member(&self) -> Option<&MemberPath> {
        match self {
            Expr::Member(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expr::Constant(DbValue::Null))
    }
}
