use crate::{
    config::CompilerConfig,
    dialect::{
        datetime_digits, format_datetime, format_offset, format_time, hex, pipe_concat, quote_string,
        Dialect, DialectKind, FunctionTable, FunctionTemplate, IdentityRetrieval, Intrinsic, IDENTITY_COLUMN,
    },
    metadata::ColumnMeta,
    value::DbValue,
};

pub struct Sqlite {
    functions: FunctionTable,
}

impl Default for Sqlite {
    fn default() -> Self {
        Self::new()
    }
}

impl Sqlite {
    pub fn new() -> Self {
        use FunctionTemplate::{Pattern, Render};
        use Intrinsic::*;
        let functions = FunctionTable::common().with(vec![
            (Contains, Pattern("{0} LIKE '%' || {1} || '%'")),
            (StartsWith, Pattern("{0} LIKE {1} || '%'")),
            (EndsWith, Pattern("{0} LIKE '%' || {1}")),
            (Substring, Render(substring)),
            (Length, Pattern("LENGTH({0})")),
            (IndexOf, Pattern("(INSTR({0}, {1}) - 1)")),
            (Concat, Render(pipe_concat)),
            (ToString, Pattern("CAST({0} AS TEXT)")),
            (Now, Pattern("DATETIME('now', 'localtime')")),
            (UtcNow, Pattern("DATETIME('now')")),
            (Today, Pattern("DATE('now', 'localtime')")),
            (Date, Pattern("DATE({0})")),
            (Year, Pattern("CAST(STRFTIME('%Y', {0}) AS INTEGER)")),
            (Month, Pattern("CAST(STRFTIME('%m', {0}) AS INTEGER)")),
            (Day, Pattern("CAST(STRFTIME('%d', {0}) AS INTEGER)")),
            (Hour, Pattern("CAST(STRFTIME('%H', {0}) AS INTEGER)")),
            (Minute, Pattern("CAST(STRFTIME('%M', {0}) AS INTEGER)")),
            (Second, Pattern("CAST(STRFTIME('%S', {0}) AS INTEGER)")),
            (DayOfWeek, Pattern("CAST(STRFTIME('%w', {0}) AS INTEGER)")),
            (AddYears, Pattern("DATETIME({0}, {1} || ' years')")),
            (AddMonths, Pattern("DATETIME({0}, {1} || ' months')")),
            (AddDays, Pattern("DATETIME({0}, {1} || ' days')")),
            (AddHours, Pattern("DATETIME({0}, {1} || ' hours')")),
            (AddMinutes, Pattern("DATETIME({0}, {1} || ' minutes')")),
            (AddSeconds, Pattern("DATETIME({0}, {1} || ' seconds')")),
            (Ceiling, Pattern("CEIL({0})")),
            (Truncate, Pattern("CAST({0} AS INTEGER)")),
            (Coalesce, Pattern("IFNULL({0}, {1})")),
            (NewGuid, Pattern("LOWER(HEX(RANDOMBLOB(16)))")),
        ]);
        Self { functions }
    }
}

fn substring(args: &[String]) -> String {
    match args {
        [s, start] => format!("SUBSTR({}, {} + 1)", s, start),
        [s, start, len, ..] => format!("SUBSTR({}, {} + 1, {})", s, start, len),
        _ => String::new(),
    }
}

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    fn render_literal(&self, value: &DbValue, hint: Option<&ColumnMeta>, config: &CompilerConfig) -> String {
        let digits = || datetime_digits(hint, config, 3, 7);
        match value {
            DbValue::Null => self.null_literal().to_string(),
            DbValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            DbValue::Int(i) => i.to_string(),
            DbValue::Float(f) => f.to_string(),
            DbValue::Decimal(d) => d.clone(),
            DbValue::String(s) => quote_string(s, false),
            DbValue::Bytes(b) => format!("X'{}'", hex(b)),
            DbValue::Guid(g) => format!("'{}'", g),
            DbValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            DbValue::Time(t) => format!("'{}'", format_time(t, digits())),
            DbValue::DateTime(dt) => format!("'{}'", format_datetime(dt, digits())),
            DbValue::DateTimeOffset(dt) => format!(
                "'{}{}'",
                format_datetime(&dt.naive_local(), digits()),
                format_offset(dt.offset())
            ),
        }
    }

    fn identity_retrieval(&self, _table: &str, _column: &str) -> IdentityRetrieval {
        IdentityRetrieval::Select(format!("SELECT last_insert_rowid() AS {}", self.quote(IDENTITY_COLUMN)))
    }

    fn page_suffix(&self, skip: u64, take: u64) -> Option<String> {
        match (skip, take) {
            (0, 0) => None,
            (0, take) => Some(format!("LIMIT {}", take)),
            (skip, 0) => Some(format!("LIMIT -1 OFFSET {}", skip)),
            (skip, take) => Some(format!("LIMIT {} OFFSET {}", take, skip)),
        }
    }

    fn table_alias(&self, table: &str, alias: &str) -> String {
        format!("{} AS {}", table, alias)
    }
}
