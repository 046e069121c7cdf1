use std::fmt::Display;

/// Defects in metadata or compiler wiring. These are not recoverable by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    AliasCollision(String),
    UnresolvedAlias(String),
    UnknownEntity(String),
    UnknownMember { entity: String, member: String },
    InvalidIdentifier(String),
    ForeignKeyArity { entity: String, member: String },
    UnknownDialect(String),
    Load(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::AliasCollision(key) => write!(f, "alias key '{}' is already allocated", key),
            ConfigurationError::UnresolvedAlias(key) => write!(f, "no alias allocated for '{}'", key),
            ConfigurationError::UnknownEntity(name) => write!(f, "entity '{}' is not registered", name),
            ConfigurationError::UnknownMember { entity, member } =>
                write!(f, "entity '{}' has no member '{}'", entity, member),
            ConfigurationError::InvalidIdentifier(name) => write!(f, "'{}' is not a valid identifier", name),
            ConfigurationError::ForeignKeyArity { entity, member } =>
                write!(f, "foreign key '{}.{}' has inner and outer keys of different length", entity, member),
            ConfigurationError::UnknownDialect(name) => write!(f, "dialect '{}' is not registered", name),
            ConfigurationError::Load(message) => write!(f, "cannot load metadata: {}", message),
        }
    }
}

impl std::error::Error for ConfigurationError {}
