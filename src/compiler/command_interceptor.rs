use crate::{compiler::Command, error::OrmError};

/// Observes every compile attempt of a `QueryCompiler`.
pub trait CommandInterceptor: Send + Sync {
    fn on_compiled(&self, _command: &Command) {}

    fn on_failed(&self, _error: &OrmError) {}
}
