use crate::{
    config::CompilerConfig,
    dialect::{
        datetime_digits, format_datetime, format_offset, format_time, hex, quote_string,
        Dialect, DialectKind, DmlStyle, FunctionTable, FunctionTemplate, IdentityRetrieval, Intrinsic, IDENTITY_COLUMN,
    },
    metadata::{ColumnMeta, DbType},
    value::DbValue,
};

pub struct SqlServer {
    functions: FunctionTable,
}

impl Default for SqlServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlServer {
    pub fn new() -> Self {
        use FunctionTemplate::{Pattern, Render};
        use Intrinsic::*;
        let functions = FunctionTable::common().with(vec![
            (Contains, Pattern("{0} LIKE '%' + {1} + '%'")),
            (StartsWith, Pattern("{0} LIKE {1} + '%'")),
            (EndsWith, Pattern("{0} LIKE '%' + {1}")),
            (Substring, Render(substring)),
            (Length, Pattern("LEN({0})")),
            (Trim, Pattern("LTRIM(RTRIM({0}))")),
            (IndexOf, Pattern("(CHARINDEX({1}, {0}) - 1)")),
            (Concat, Render(plus_concat)),
            (ToString, Pattern("CAST({0} AS NVARCHAR(MAX))")),
            (Now, Pattern("GETDATE()")),
            (UtcNow, Pattern("GETUTCDATE()")),
            (Today, Pattern("CAST(GETDATE() AS DATE)")),
            (Date, Pattern("CAST({0} AS DATE)")),
            (Year, Pattern("DATEPART(YEAR, {0})")),
            (Month, Pattern("DATEPART(MONTH, {0})")),
            (Day, Pattern("DATEPART(DAY, {0})")),
            (Hour, Pattern("DATEPART(HOUR, {0})")),
            (Minute, Pattern("DATEPART(MINUTE, {0})")),
            (Second, Pattern("DATEPART(SECOND, {0})")),
            (DayOfWeek, Pattern("(DATEPART(WEEKDAY, {0}) - 1)")),
            (AddYears, Pattern("DATEADD(YEAR, {1}, {0})")),
            (AddMonths, Pattern("DATEADD(MONTH, {1}, {0})")),
            (AddDays, Pattern("DATEADD(DAY, {1}, {0})")),
            (AddHours, Pattern("DATEADD(HOUR, {1}, {0})")),
            (AddMinutes, Pattern("DATEADD(MINUTE, {1}, {0})")),
            (AddSeconds, Pattern("DATEADD(SECOND, {1}, {0})")),
            (Ceiling, Pattern("CEILING({0})")),
            (Truncate, Pattern("ROUND({0}, 0, 1)")),
            (Coalesce, Pattern("ISNULL({0}, {1})")),
            (NewGuid, Pattern("NEWID()")),
        ]);
        Self { functions }
    }
}

fn substring(args: &[String]) -> String {
    match args {
        [s, start] => format!("SUBSTRING({}, {} + 1, LEN({}))", s, start, s),
        [s, start, len, ..] => format!("SUBSTRING({}, {} + 1, {})", s, start, len),
        _ => String::new(),
    }
}

fn plus_concat(args: &[String]) -> String {
    format!("({})", args.join(" + "))
}

impl Dialect for SqlServer {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
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
            DbValue::String(s) => {
                let ansi = hint.map(|c| c.db_type == DbType::AnsiString).unwrap_or(false);
                if ansi { quote_string(s, false) } else { format!("N{}", quote_string(s, false)) }
            }
            DbValue::Bytes(b) => format!("0x{}", hex(b)),
            DbValue::Guid(g) => format!("'{}'", g),
            DbValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            DbValue::Time(t) => format!("'{}'", format_time(t, digits())),
            DbValue::DateTime(dt) => format!("'{}'", format_datetime(dt, digits())),
            DbValue::DateTimeOffset(dt) => format!(
                "TODATETIMEOFFSET('{}', '{}')",
                format_datetime(&dt.naive_local(), digits()),
                format_offset(dt.offset())
            ),
        }
    }

    fn identity_retrieval(&self, _table: &str, _column: &str) -> IdentityRetrieval {
        IdentityRetrieval::Select(format!("SELECT CAST(SCOPE_IDENTITY() AS BIGINT) AS {}", self.quote(IDENTITY_COLUMN)))
    }

    fn page_prefix(&self, skip: u64, take: u64) -> Option<String> {
        (take > 0 && skip == 0).then(|| format!("TOP({})", take))
    }

    fn page_suffix(&self, skip: u64, take: u64) -> Option<String> {
        if skip == 0 {
            return None;
        }
        let mut clause = format!("OFFSET {} ROWS", skip);
        if take > 0 {
            clause.push_str(&format!(" FETCH NEXT {} ROWS ONLY", take));
        }
        Some(clause)
    }

    fn exists_wrap(&self, inner: &str) -> String {
        format!("IF EXISTS(\n{}\n) SELECT 1 ELSE SELECT 0", inner)
    }

    fn table_hint(&self, config: &CompilerConfig) -> Option<&'static str> {
        config.no_lock.then_some("WITH (NOLOCK)")
    }

    fn dml_style(&self) -> DmlStyle {
        DmlStyle::UpdateFrom
    }
}
