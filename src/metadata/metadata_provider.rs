use crate::{error::TranslationError, metadata::EntityMeta};

/// Source of entity mappings. The compiler and materializer never discover metadata on their own.
pub trait MetadataProvider {
    fn entity(&self, name: &str) -> Option<&EntityMeta>;

    fn require(&self, name: &str) -> Result<&EntityMeta, TranslationError> {
        self.entity(name).ok_or_else(|| TranslationError::UnknownEntity(name.to_string()))
    }
}
