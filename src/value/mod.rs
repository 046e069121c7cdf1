pub mod db_value;
pub use db_value::*;
