pub mod intrinsic;
pub use intrinsic::*;

pub mod function_table;
pub use function_table::*;

pub mod literal_writer;
pub use literal_writer::*;

pub mod dialect;
pub use dialect::*;

pub mod sql_server;
pub use sql_server::*;

pub mod mysql;
pub use mysql::*;

pub mod postgres;
pub use postgres::*;

pub mod oracle;
pub use oracle::*;

pub mod sqlite;
pub use sqlite::*;

pub mod dialect_registry;
pub use dialect_registry::*;
