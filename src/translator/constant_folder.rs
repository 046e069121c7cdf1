use ordered_float::NotNan;

use crate::{query::{BinaryOp, Expr, UnaryOp}, value::DbValue};

/// Evaluates closed subtrees ahead of translation.
pub struct ConstantFolder;

impl ConstantFolder {
    /// `None` when the subtree references a source or cannot be evaluated safely
    /// (division by zero, overflow, mixed types); the SQL side evaluates it then.
    pub fn fold(expr: &Expr) -> Option<DbValue> {
        match expr {
            Expr::Constant(v) => Some(v.clone()),
            Expr::Binary { op, left, right } => {
                let l = Self::fold(left)?;
                let r = Self::fold(right)?;
                Self::binary(*op, &l, &r)
            }
            Expr::Unary { op: UnaryOp::Not, operand } => match Self::fold(operand)? {
                DbValue::Bool(b) => Some(DbValue::Bool(!b)),
                _ => None,
            },
            Expr::Unary { op: UnaryOp::Negate, operand } => match Self::fold(operand)? {
                DbValue::Int(i) => i.checked_neg().map(DbValue::Int),
                DbValue::Float(f) => Some(DbValue::Float(-f)),
                _ => None,
            },
            Expr::Coalesce { left, right } => match Self::fold(left)? {
                DbValue::Null => Self::fold(right),
                v => Some(v),
            },
            Expr::Conditional { test, if_true, if_false } => match Self::fold(test)? {
                DbValue::Bool(true) => Self::fold(if_true),
                DbValue::Bool(false) => Self::fold(if_false),
                _ => None,
            },
            Expr::InList { expr, list, negated } => {
                let v = Self::fold(expr)?;
                if v.is_null() {
                    return None;
                }
                let items = list.iter().map(Self::fold).collect::<Option<Vec<_>>>()?;
                Some(DbValue::Bool(items.contains(&v) != *negated))
            }
            _ => None,
        }
    }

    fn binary(op: BinaryOp, l: &DbValue, r: &DbValue) -> Option<DbValue> {
        use DbValue::*;
        if l.is_null() || r.is_null() {
            return None;
        }
        match (op, l, r) {
            (BinaryOp::And, Bool(a), Bool(b)) => Some(Bool(*a && *b)),
            (BinaryOp::Or, Bool(a), Bool(b)) => Some(Bool(*a || *b)),
            (BinaryOp::Concat, String(a), String(b)) => Some(String(format!("{}{}", a, b))),
            (op, Int(a), Int(b)) if !op.is_comparison() => match op {
                BinaryOp::Add => a.checked_add(*b).map(Int),
                BinaryOp::Sub => a.checked_sub(*b).map(Int),
                BinaryOp::Mul => a.checked_mul(*b).map(Int),
                BinaryOp::Div => a.checked_div(*b).map(Int),
                BinaryOp::Mod => a.checked_rem(*b).map(Int),
                _ => None,
            },
            (op, _, _) if op.is_comparison() => Self::compare(op, l, r).map(Bool),
            (op, _, _) => {
                let (a, b) = (l.as_f64()?, r.as_f64()?);
                if matches!((l, r), (Decimal(_), _) | (_, Decimal(_))) {
                    return None;
                }
                let v = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div if b != 0.0 => a / b,
                    _ => return None,
                };
                NotNan::new(v).ok().filter(|f| f.is_finite()).map(Float)
            }
        }
    }

    fn compare(op: BinaryOp, l: &DbValue, r: &DbValue) -> Option<bool> {
        use std::cmp::Ordering;
        let ordering = match (l, r) {
            (DbValue::String(a), DbValue::String(b)) => a.cmp(b),
            (DbValue::Bool(a), DbValue::Bool(b)) => a.cmp(b),
            (DbValue::Int(a), DbValue::Int(b)) => a.cmp(b),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?)?,
        };
        Some(match op {
            BinaryOp::Eq => ordering == Ordering::Equal,
            BinaryOp::Ne => ordering != Ordering::Equal,
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => return None,
        })
    }
}
