use std::fmt::Display;

use crate::error::{ConfigurationError, MaterializationError, TranslationError};

#[derive(Debug, Clone, PartialEq)]
pub enum OrmError {
    Translation(TranslationError),
    Materialization(MaterializationError),
    Configuration(ConfigurationError),
}

impl Display for OrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrmError::Translation(err) => write!(f, "TranslationError: {}", err),
            OrmError::Materialization(err) => write!(f, "MaterializationError: {}", err),
            OrmError::Configuration(err) => write!(f, "ConfigurationError: {}", err),
        }
    }
}

impl std::error::Error for OrmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrmError::Translation(err) => Some(err),
            OrmError::Materialization(err) => Some(err),
            OrmError::Configuration(err) => Some(err),
        }
    }
}

impl From<TranslationError> for OrmError {
    fn from(err: TranslationError) -> Self {
        OrmError::Translation(err)
    }
}

impl From<MaterializationError> for OrmError {
    fn from(err: MaterializationError) -> Self {
        OrmError::Materialization(err)
    }
}

impl From<ConfigurationError> for OrmError {
    fn from(err: ConfigurationError) -> Self {
        OrmError::Configuration(err)
    }
}
