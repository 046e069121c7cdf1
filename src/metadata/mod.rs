pub mod db_type;
pub use db_type::*;

pub mod column_meta;
pub use column_meta::*;

pub mod foreign_key;
pub use foreign_key::*;

pub mod navigation_meta;
pub use navigation_meta::*;

pub mod entity_meta;
pub use entity_meta::*;

pub mod metadata_provider;
pub use metadata_provider::*;

pub mod metadata_registry;
pub use metadata_registry::*;
