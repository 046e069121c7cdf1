use std::fmt::Display;

/// Raised while turning a query AST into SQL. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationError {
    UnsupportedMethod(String),
    UnsupportedMember { entity: String, member: String },
    UnknownEntity(String),
    ArgumentMismatch { method: String, expected: String, found: usize },
    SkipWithoutOrderBy,
    MissingKeyColumn { entity: String, operation: String },
    MissingForeignKey { member: String },
    UnsupportedProjection(String),
    MalformedUnion(String),
    InvalidValue { member: String, reason: String },
    Unsupported(String),
}

impl Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationError::UnsupportedMethod(name) =>
                write!(f, "method '{}' is not supported", name),
            TranslationError::UnsupportedMember { entity, member } =>
                write!(f, "member '{}' of '{}' cannot be translated", member, entity),
            TranslationError::UnknownEntity(name) =>
                write!(f, "entity '{}' has no metadata", name),
            TranslationError::ArgumentMismatch { method, expected, found } =>
                write!(f, "method '{}' expects {} argument(s), got {}", method, expected, found),
            TranslationError::SkipWithoutOrderBy =>
                write!(f, "the method 'OrderBy' must be called before 'Skip'"),
            TranslationError::MissingKeyColumn { entity, operation } =>
                write!(f, "{} of entity '{}' requires at least one key column", operation, entity),
            TranslationError::MissingForeignKey { member } =>
                write!(f, "navigation '{}' must declare a foreign key", member),
            TranslationError::UnsupportedProjection(reason) =>
                write!(f, "unsupported projection: {}", reason),
            TranslationError::MalformedUnion(reason) =>
                write!(f, "malformed union branch: {}", reason),
            TranslationError::InvalidValue { member, reason } =>
                write!(f, "invalid value for '{}': {}", member, reason),
            TranslationError::Unsupported(reason) =>
                write!(f, "unsupported: {}", reason),
        }
    }
}

impl std::error::Error for TranslationError {}
