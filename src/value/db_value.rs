use std::fmt::Display;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::NotNan;
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::metadata::DbType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A value crossing the boundary between the object model and the database:
/// constants and parameters on the way in, cursor cells on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DbValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(NotNan<f64>),
    /// Exact numeric kept as its decimal text.
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DbValue::Null => "Null",
            DbValue::Bool(_) => "Bool",
            DbValue::Int(_) => "Int",
            DbValue::Float(_) => "Float",
            DbValue::Decimal(_) => "Decimal",
            DbValue::String(_) => "String",
            DbValue::Bytes(_) => "Bytes",
            DbValue::Guid(_) => "Guid",
            DbValue::Date(_) => "Date",
            DbValue::Time(_) => "Time",
            DbValue::DateTime(_) => "DateTime",
            DbValue::DateTimeOffset(_) => "DateTimeOffset",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DbValue::Int(i) => Some(*i),
            DbValue::Float(f) if f.fract() == 0.0 => Some(f.into_inner() as i64),
            DbValue::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DbValue::Int(i) => Some(*i as f64),
            DbValue::Float(f) => Some(f.into_inner()),
            DbValue::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }

    /// Plain JSON rendering used when hydrating entities.
    pub fn to_json(&self) -> Value {
        match self {
            DbValue::Null => Value::Null,
            DbValue::Bool(b) => Value::Bool(*b),
            DbValue::Int(i) => Value::Number(Number::from(*i)),
            DbValue::Float(f) => Number::from_f64(f.into_inner()).map(Value::Number).unwrap_or(Value::Null),
            DbValue::Decimal(d) => d.parse::<f64>().ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(d.clone())),
            DbValue::String(s) => Value::String(s.clone()),
            DbValue::Bytes(b) => Value::Array(b.iter().map(|x| Value::Number(Number::from(*x))).collect()),
            DbValue::Guid(g) => Value::String(g.to_string()),
            DbValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            DbValue::Time(t) => Value::String(t.format(TIME_FORMAT).to_string()),
            DbValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            DbValue::DateTimeOffset(dt) => Value::String(dt.to_rfc3339()),
        }
    }

    /// Reads an entity member value, guided by the column type when one is known.
    pub fn from_json(value: &Value, db_type: Option<DbType>) -> Result<DbValue, String> {
        if value.is_null() {
            return Ok(DbValue::Null);
        }
        let Some(db_type) = db_type else {
            return Self::infer_json(value);
        };
        let mismatch = || format!("{} is not a valid {}", value, db_type);
        match db_type {
            DbType::Bool => match value {
                Value::Bool(b) => Ok(DbValue::Bool(*b)),
                Value::Number(n) => n.as_i64().map(|i| DbValue::Bool(i != 0)).ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            DbType::Int => match value {
                Value::Number(n) => n.as_i64().map(DbValue::Int).ok_or_else(mismatch),
                Value::String(s) => s.trim().parse().map(DbValue::Int).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            DbType::Float => match value {
                Value::Number(n) => n.as_f64().and_then(|f| NotNan::new(f).ok()).map(DbValue::Float).ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            DbType::Decimal => match value {
                Value::Number(n) => Ok(DbValue::Decimal(n.to_string())),
                Value::String(s) if s.parse::<f64>().is_ok() => Ok(DbValue::Decimal(s.clone())),
                _ => Err(mismatch()),
            },
            DbType::String | DbType::AnsiString => match value {
                Value::String(s) => Ok(DbValue::String(s.clone())),
                _ => Err(mismatch()),
            },
            DbType::Binary => match value {
                Value::Array(items) => items.iter()
                    .map(|x| x.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .map(DbValue::Bytes)
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            DbType::Guid => value.as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(DbValue::Guid)
                .ok_or_else(mismatch),
            DbType::Date => value.as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                .map(DbValue::Date)
                .ok_or_else(mismatch),
            DbType::Time => value.as_str()
                .and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok())
                .map(DbValue::Time)
                .ok_or_else(mismatch),
            DbType::DateTime | DbType::DateTime2 => value.as_str()
                .and_then(parse_datetime)
                .map(DbValue::DateTime)
                .ok_or_else(mismatch),
            DbType::DateTimeOffset => value.as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(DbValue::DateTimeOffset)
                .ok_or_else(mismatch),
        }
    }

    fn infer_json(value: &Value) -> Result<DbValue, String> {
        match value {
            Value::Null => Ok(DbValue::Null),
            Value::Bool(b) => Ok(DbValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(DbValue::Int(i)),
                None => n.as_f64()
                    .and_then(|f| NotNan::new(f).ok())
                    .map(DbValue::Float)
                    .ok_or_else(|| format!("{} is not a finite number", n)),
            },
            Value::String(s) => Ok(DbValue::String(s.clone())),
            other => Err(format!("{} has no column representation", other)),
        }
    }
}

/// Accepts both `T` and space separated forms.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

impl Display for DbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbValue::Null => write!(f, "NULL"),
            DbValue::String(s) => write!(f, "'{}'", s),
            DbValue::Bytes(b) => write!(f, "<{} byte(s)>", b.len()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for DbValue {
    fn from(v: bool) -> Self { DbValue::Bool(v) }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self { DbValue::Int(v as i64) }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self { DbValue::Int(v) }
}

impl From<u32> for DbValue {
    fn from(v: u32) -> Self { DbValue::Int(v as i64) }
}

/// NaN has no SQL literal and maps to `Null`.
impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        NotNan::new(v).map(DbValue::Float).unwrap_or(DbValue::Null)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self { DbValue::String(v.to_string()) }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self { DbValue::String(v) }
}

impl From<Vec<u8>> for DbValue {
    fn from(v: Vec<u8>) -> Self { DbValue::Bytes(v) }
}

impl From<Uuid> for DbValue {
    fn from(v: Uuid) -> Self { DbValue::Guid(v) }
}

impl From<NaiveDate> for DbValue {
    fn from(v: NaiveDate) -> Self { DbValue::Date(v) }
}

impl From<NaiveTime> for DbValue {
    fn from(v: NaiveTime) -> Self { DbValue::Time(v) }
}

impl From<NaiveDateTime> for DbValue {
    fn from(v: NaiveDateTime) -> Self { DbValue::DateTime(v) }
}

impl From<DateTime<FixedOffset>> for DbValue {
    fn from(v: DateTime<FixedOffset>) -> Self { DbValue::DateTimeOffset(v) }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(DbValue::Null)
    }
}
