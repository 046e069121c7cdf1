use std::fmt::Display;

use serde::Deserialize;

/// Semantic type hint of a mapped column. Drives literal rendering and value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DbType {
    Bool,
    Int,
    Float,
    Decimal,
    /// Unicode text.
    String,
    AnsiString,
    Binary,
    Guid,
    Date,
    Time,
    /// Legacy datetime with millisecond precision.
    DateTime,
    DateTime2,
    DateTimeOffset,
}

impl DbType {
    pub fn is_text(&self) -> bool {
        matches!(self, DbType::String | DbType::AnsiString)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DbType::Date | DbType::Time | DbType::DateTime | DbType::DateTime2 | DbType::DateTimeOffset)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DbType::Int | DbType::Float | DbType::Decimal)
    }
}

impl Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DbType::Bool => "Bool",
            DbType::Int => "Int",
            DbType::Float => "Float",
            DbType::Decimal => "Decimal",
            DbType::String => "String",
            DbType::AnsiString => "AnsiString",
            DbType::Binary => "Binary",
            DbType::Guid => "Guid",
            DbType::Date => "Date",
            DbType::Time => "Time",
            DbType::DateTime => "DateTime",
            DbType::DateTime2 => "DateTime2",
            DbType::DateTimeOffset => "DateTimeOffset",
        };
        write!(f, "{}", s)
    }
}
