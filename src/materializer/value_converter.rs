use chrono::{DateTime, NaiveDate, NaiveTime};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::{
    error::MaterializationError,
    metadata::DbType,
    value::{parse_datetime, DbValue, DATE_FORMAT, TIME_FORMAT},
};

/// Coerces cursor cells to the member's declared type before they land in an entity.
pub struct ValueConverter;

impl ValueConverter {
    pub fn convert(value: DbValue, declared: Option<DbType>, column: &str) -> Result<Value, MaterializationError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let Some(db_type) = declared else {
            return Ok(value.to_json());
        };
        let converted = match db_type {
            DbType::Bool => Self::to_bool(&value),
            DbType::Int => Self::to_int(&value),
            DbType::Float => value.as_f64()
                .or_else(|| Self::text(&value).and_then(|s| s.trim().parse().ok()))
                .and_then(Number::from_f64)
                .map(Value::Number),
            DbType::Decimal => match &value {
                DbValue::String(s) if s.trim().parse::<f64>().is_ok() => Some(DbValue::Decimal(s.trim().to_string()).to_json()),
                other => other.as_f64().map(|_| other.to_json()),
            },
            DbType::String | DbType::AnsiString => match &value {
                DbValue::String(s) => Some(Value::String(s.clone())),
                DbValue::Int(i) => Some(Value::String(i.to_string())),
                DbValue::Float(f) => Some(Value::String(f.to_string())),
                DbValue::Decimal(d) => Some(Value::String(d.clone())),
                DbValue::Guid(g) => Some(Value::String(g.to_string())),
                _ => None,
            },
            DbType::Binary => match &value {
                DbValue::Bytes(_) => Some(value.to_json()),
                _ => None,
            },
            DbType::Guid => match &value {
                DbValue::Guid(g) => Some(g.to_string()),
                DbValue::String(s) => Uuid::parse_str(s.trim()).ok().map(|g| g.to_string()),
                DbValue::Bytes(b) => Uuid::from_slice(b).ok().map(|g| g.to_string()),
                _ => None,
            }.map(Value::String),
            DbType::Date => match &value {
                DbValue::Date(d) => Some(*d),
                DbValue::DateTime(dt) => Some(dt.date()),
                DbValue::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
                    .or_else(|| parse_datetime(s.trim()).map(|dt| dt.date())),
                _ => None,
            }.map(|d| DbValue::Date(d).to_json()),
            DbType::Time => match &value {
                DbValue::Time(t) => Some(*t),
                DbValue::String(s) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT).ok(),
                _ => None,
            }.map(|t| DbValue::Time(t).to_json()),
            DbType::DateTime | DbType::DateTime2 => match &value {
                DbValue::DateTime(dt) => Some(*dt),
                DbValue::Date(d) => d.and_hms_opt(0, 0, 0),
                DbValue::DateTimeOffset(dt) => Some(dt.naive_local()),
                DbValue::String(s) => parse_datetime(s.trim()),
                _ => None,
            }.map(|dt| DbValue::DateTime(dt).to_json()),
            DbType::DateTimeOffset => match &value {
                DbValue::DateTimeOffset(dt) => Some(*dt),
                DbValue::DateTime(dt) => Some(dt.and_utc().fixed_offset()),
                DbValue::String(s) => DateTime::parse_from_rfc3339(s.trim()).ok(),
                _ => None,
            }.map(|dt| DbValue::DateTimeOffset(dt).to_json()),
        };
        converted.ok_or_else(|| MaterializationError::Conversion {
            column: column.to_string(),
            declared_type: db_type.to_string(),
            raw: value.to_string(),
        })
    }

    fn to_bool(value: &DbValue) -> Option<Value> {
        let b = match value {
            DbValue::Bool(b) => Some(*b),
            DbValue::Int(i) => Some(*i != 0),
            DbValue::Decimal(_) | DbValue::Float(_) => value.as_f64().map(|f| f != 0.0),
            DbValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "y" => Some(true),
                "false" | "0" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        };
        b.map(Value::Bool)
    }

    fn to_int(value: &DbValue) -> Option<Value> {
        let i = match value {
            DbValue::Bool(b) => Some(i64::from(*b)),
            DbValue::String(s) => s.trim().parse().ok(),
            other => other.as_i64(),
        };
        i.map(|i| Value::Number(Number::from(i)))
    }

    fn text(value: &DbValue) -> Option<&str> {
        match value {
            DbValue::String(s) => Some(s),
            _ => None,
        }
    }
}
