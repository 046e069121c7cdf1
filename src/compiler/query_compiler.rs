use std::sync::Arc;

use tracing::debug;

use crate::{
    compiler::{Command, CommandInterceptor, CommandKind, DeleteCompiler, InsertCompiler, SelectCompiler, UpdateCompiler},
    config::CompilerConfig,
    dialect::Dialect,
    error::OrmError,
    metadata::MetadataProvider,
    query::{DeleteQuery, InsertQuery, SelectQuery, UpdateQuery},
    translator::{AliasScope, TranslateContext},
};

/// Entry point turning query ASTs into `Command`s for one dialect.
///
/// Each call compiles with its own context, so one `QueryCompiler` can serve any
/// number of statements; the produced commands share nothing.
pub struct QueryCompiler<'m> {
    dialect: Arc<dyn Dialect>,
    metadata: &'m dyn MetadataProvider,
    config: CompilerConfig,
    interceptors: Vec<Arc<dyn CommandInterceptor>>,
}

impl<'m> QueryCompiler<'m> {
    pub fn new(dialect: Arc<dyn Dialect>, metadata: &'m dyn MetadataProvider) -> Self {
        Self { dialect, metadata, config: CompilerConfig::default(), interceptors: Vec::new() }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn CommandInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile_select(&self, query: &SelectQuery) -> Result<Command, OrmError> {
        let mut ctx = TranslateContext::new(self.dialect.as_ref(), self.metadata, &self.config);
        let result = SelectCompiler::compile(&mut ctx, query, AliasScope::new(), 0, false).map(|compiled| {
            Command::new(CommandKind::Select, compiled.text, ctx.parameters.into_vec()).with_rows(
                compiled.columns,
                compiled.navigations,
                compiled.has_many,
                compiled.entity,
                compiled.root_keys,
            )
        });
        self.finish(result)
    }

    pub fn compile_insert(&self, query: &InsertQuery) -> Result<Command, OrmError> {
        let mut ctx = TranslateContext::new(self.dialect.as_ref(), self.metadata, &self.config);
        let result = InsertCompiler::compile(&mut ctx, query).map(|compiled| {
            let command = Command::new(CommandKind::Insert, compiled.text, ctx.parameters.into_vec());
            match compiled.identity {
                Some(member) => command.with_identity(&query.entity, &member),
                None => command,
            }
        });
        self.finish(result)
    }

    pub fn compile_update(&self, query: &UpdateQuery) -> Result<Command, OrmError> {
        let mut ctx = TranslateContext::new(self.dialect.as_ref(), self.metadata, &self.config);
        let result = UpdateCompiler::compile(&mut ctx, query)
            .map(|text| Command::new(CommandKind::Update, text, ctx.parameters.into_vec()));
        self.finish(result)
    }

    pub fn compile_delete(&self, query: &DeleteQuery) -> Result<Command, OrmError> {
        let mut ctx = TranslateContext::new(self.dialect.as_ref(), self.metadata, &self.config);
        let result = DeleteCompiler::compile(&mut ctx, query)
            .map(|text| Command::new(CommandKind::Delete, text, ctx.parameters.into_vec()));
        self.finish(result)
    }

    fn finish(&self, result: Result<Command, OrmError>) -> Result<Command, OrmError> {
        match &result {
            Ok(command) => {
                debug!(
                    target: "ormql::compiler",
                    dialect = self.dialect.name(),
                    kind = ?command.kind(),
                    parameters = command.parameters().len(),
                    sql = %command.text(),
                    "compiled command"
                );
                for interceptor in &self.interceptors {
                    interceptor.on_compiled(command);
                }
            }
            Err(err) => {
                debug!(target: "ormql::compiler", dialect = self.dialect.name(), error = %err, "compilation failed");
                for interceptor in &self.interceptors {
                    interceptor.on_failed(err);
                }
            }
        }
        result
    }
}
