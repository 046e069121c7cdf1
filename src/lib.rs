pub mod error;
pub use error::{ConfigurationError, MaterializationError, OrmError, TranslationError};

pub mod config;
pub use config::CompilerConfig;

pub mod metadata;
pub use metadata::{ColumnMeta, DbType, EntityMeta, ForeignKey, MetadataProvider, MetadataRegistry, NavigationMeta};

pub mod value;
pub use value::DbValue;

pub mod query;

pub mod dialect;
pub use dialect::{Dialect, DialectRegistry};

pub mod translator;

pub mod compiler;
pub use compiler::{Command, CommandInterceptor, CommandKind, QueryCompiler};

pub mod materializer;
pub use materializer::{EntityStream, IdentityFeedback, MaterializationPlan, Materializer, MemoryCursor, PlanCache, RowCursor};
