pub mod alias_scope;
pub use alias_scope::*;

pub mod parameters;
pub use parameters::*;

pub mod translate_context;
pub use translate_context::*;

pub mod sql_writer;
pub use sql_writer::*;

pub mod descriptors;
pub use descriptors::*;

pub mod constant_folder;
pub use constant_folder::*;

pub mod navigation_resolver;
pub use navigation_resolver::*;

pub mod expression_translator;
pub use expression_translator::*;

pub mod select_translator;
pub use select_translator::*;

pub mod where_translator;
pub use where_translator::*;

pub mod join_translator;
pub use join_translator::*;

pub mod group_by_translator;
pub use group_by_translator::*;

pub mod having_translator;
pub use having_translator::*;

pub mod order_by_translator;
pub use order_by_translator::*;
