use crate::{
    config::CompilerConfig,
    dialect::FunctionTable,
    metadata::ColumnMeta,
    query::{AggregateKind, JoinKind},
    value::DbValue,
};

/// Column alias of the generated id returned after an insert.
pub const IDENTITY_COLUMN: &str = "AutoId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    SqlServer,
    MySql,
    Postgres,
    Oracle,
    Sqlite,
}

/// How UPDATE/DELETE statements carry their alias and joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlStyle {
    /// `UPDATE t0 SET .. FROM T t0 JOIN ..` / `DELETE t0 FROM T t0 JOIN ..`
    UpdateFrom,
    /// `UPDATE T t0 JOIN .. SET ..` / `DELETE t0 FROM T t0 JOIN ..`
    UpdateJoin,
    /// `UPDATE T t0 SET ..` / `DELETE FROM T t0`, no joins.
    Standard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityRetrieval {
    /// Follow-up statement returning one row with the generated id.
    Select(String),
    /// Clause appended to the INSERT that fills an output parameter.
    Returning { clause: String, parameter: String },
}

/// Everything the compilers need to know about one SQL dialect.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    /// Registry name, lower case.
    fn name(&self) -> &'static str;

    fn quote_chars(&self) -> (char, char);

    fn parameter_prefix(&self) -> &'static str;

    fn functions(&self) -> &FunctionTable;

    fn render_literal(&self, value: &DbValue, hint: Option<&ColumnMeta>, config: &CompilerConfig) -> String;

    fn identity_retrieval(&self, table: &str, column: &str) -> IdentityRetrieval;

    /// Trailing pagination clause, after ORDER BY.
    fn page_suffix(&self, skip: u64, take: u64) -> Option<String>;

    /// Quotes each dot-separated part, doubling embedded closing quotes.
    fn quote(&self, identifier: &str) -> String {
        let (open, close) = self.quote_chars();
        let doubled = format!("{}{}", close, close);
        identifier
            .split('.')
            .map(|part| format!("{}{}{}", open, part.replace(close, &doubled), close))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn parameter_name(&self, index: usize) -> String {
        format!("{}p{}", self.parameter_prefix(), index)
    }

    fn null_literal(&self) -> &'static str {
        "NULL"
    }

    /// Placed right after `SELECT [DISTINCT]`.
    fn page_prefix(&self, _skip: u64, _take: u64) -> Option<String> {
        None
    }

    /// Wraps a whole select for dialects that page with a derived row number.
    fn page_wrap(&self, sql: String, _skip: u64, _take: u64) -> String {
        sql
    }

    fn exists_wrap(&self, inner: &str) -> String {
        format!("SELECT CASE WHEN EXISTS(\n{}\n) THEN 1 ELSE 0 END", inner)
    }

    /// FROM clause for a select without a source, if the dialect needs one.
    fn dummy_from(&self) -> Option<&'static str> {
        None
    }

    fn table_hint(&self, _config: &CompilerConfig) -> Option<&'static str> {
        None
    }

    fn join_keyword(&self, kind: JoinKind) -> &'static str {
        match kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }

    fn aggregate(&self, kind: AggregateKind, arg: &str) -> String {
        format!("{}({})", kind.name(), arg)
    }

    fn union_keyword(&self) -> &'static str {
        "UNION ALL"
    }

    fn dml_style(&self) -> DmlStyle {
        DmlStyle::Standard
    }

    /// Target table of an UPDATE or DELETE with its alias.
    fn table_alias(&self, table: &str, alias: &str) -> String {
        format!("{} {}", table, alias)
    }

    /// False when bulk rows need `INSERT ALL` instead of a VALUES list.
    fn multi_row_insert(&self) -> bool {
        true
    }

    fn statement_separator(&self) -> &'static str {
        ";\n"
    }

    fn bool_literal(&self, value: bool, config: &CompilerConfig) -> String {
        self.render_literal(&DbValue::Bool(value), None, config)
    }
}
