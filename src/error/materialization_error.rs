use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum MaterializationError {
    /// A cursor value could not be converted to the member's declared type.
    Conversion { column: String, declared_type: String, raw: String },
    ColumnOutOfRange { index: usize, field_count: usize },
    Deserialize { target: String, message: String },
    Cursor(String),
    /// Generated identities and inserted entities do not pair up.
    IdentityCount { ids: usize, entities: usize },
}

impl Display for MaterializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterializationError::Conversion { column, declared_type, raw } =>
                write!(f, "column '{}' declared as {} cannot hold value {}", column, declared_type, raw),
            MaterializationError::ColumnOutOfRange { index, field_count } =>
                write!(f, "column index {} is out of range, the row has {} field(s)", index, field_count),
            MaterializationError::Deserialize { target, message } =>
                write!(f, "cannot build {}: {}", target, message),
            MaterializationError::Cursor(message) =>
                write!(f, "cursor failure: {}", message),
            MaterializationError::IdentityCount { ids, entities } =>
                write!(f, "{} generated identity value(s) for {} inserted entit(ies)", ids, entities),
        }
    }
}

impl std::error::Error for MaterializationError {}
