pub mod row_cursor;
pub use row_cursor::*;

pub mod value_converter;
pub use value_converter::*;

pub mod materialization_plan;
pub use materialization_plan::*;

pub mod entity_stream;
pub use entity_stream::*;

pub mod materializer;
pub use materializer::*;

pub mod identity_feedback;
pub use identity_feedback::*;
