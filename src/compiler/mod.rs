pub mod command;
pub use command::*;

pub mod select_fragments;
pub use select_fragments::*;

pub mod select_compiler;
pub use select_compiler::*;

pub mod insert_compiler;
pub use insert_compiler::*;

pub mod update_compiler;
pub use update_compiler::*;

pub mod delete_compiler;
pub use delete_compiler::*;

pub mod command_interceptor;
pub use command_interceptor::*;

pub mod query_compiler;
pub use query_compiler::*;
