use crate::{
    config::CompilerConfig,
    dialect::Dialect,
    metadata::{ColumnMeta, MetadataProvider},
    translator::Parameters,
    value::DbValue,
};

/// State shared by every level of one compilation. Alias scopes are not here:
/// each nesting level owns its own.
pub struct TranslateContext<'a> {
    pub dialect: &'a dyn Dialect,
    pub metadata: &'a dyn MetadataProvider,
    pub config: &'a CompilerConfig,
    pub parameters: Parameters,
}

impl<'a> TranslateContext<'a> {
    pub fn new(dialect: &'a dyn Dialect, metadata: &'a dyn MetadataProvider, config: &'a CompilerConfig) -> Self {
        Self { dialect, metadata, config, parameters: Parameters::new() }
    }

    pub fn quote(&self, identifier: &str) -> String {
        self.dialect.quote(identifier)
    }

    /// `alias.[column]`
    pub fn qualify(&self, alias: &str, column: &str) -> String {
        format!("{}.{}", alias, self.dialect.quote(column))
    }

    /// Parameter or inline literal, per configuration. `NULL` is always inline.
    pub fn constant(&mut self, value: DbValue, hint: Option<&ColumnMeta>) -> String {
        if value.is_null() {
            return self.dialect.null_literal().to_string();
        }
        if self.config.parameterized {
            self.parameters.push(self.dialect, value, hint)
        } else {
            self.dialect.render_literal(&value, hint, self.config)
        }
    }

    pub fn pad(&self, depth: usize) -> String {
        " ".repeat(self.config.indent * depth)
    }
}
