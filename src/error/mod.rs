pub mod translation_error;
pub use translation_error::*;

pub mod materialization_error;
pub use materialization_error::*;

pub mod configuration_error;
pub use configuration_error::*;

pub mod orm_error;
pub use orm_error::*;
