pub mod compiler_config;
pub use compiler_config::*;
