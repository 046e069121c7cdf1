pub mod member_path;
pub use member_path::*;

pub mod operators;
pub use operators::*;

pub mod aggregate;
pub use aggregate::*;

pub mod expr;
pub use expr::*;

pub mod projection;
pub use projection::*;

pub mod include;
pub use include::*;

pub mod join;
pub use join::*;

pub mod order_by;
pub use order_by::*;

pub mod group_by;
pub use group_by::*;

pub mod select_query;
pub use select_query::*;

pub mod insert_query;
pub use insert_query::*;

pub mod update_query;
pub use update_query::*;

pub mod delete_query;
pub use delete_query::*;
