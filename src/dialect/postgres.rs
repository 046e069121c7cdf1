use crate::{
    config::CompilerConfig,
    dialect::{
        datetime_digits, format_datetime, format_offset, format_time, hex, pipe_concat, quote_string,
        Dialect, DialectKind, FunctionTable, FunctionTemplate, IdentityRetrieval, Intrinsic, IDENTITY_COLUMN,
    },
    metadata::ColumnMeta,
    value::DbValue,
};

pub struct Postgres {
    functions: FunctionTable,
}

impl Default for Postgres {
    fn default() -> Self {
        Self::new()
    }
}

impl Postgres {
    pub fn new() -> Self {
        use FunctionTemplate::{Pattern, Render};
        use Intrinsic::*;
        let functions = FunctionTable::common().with(vec![
            (Contains, Pattern("{0} LIKE '%' || {1} || '%'")),
            (StartsWith, Pattern("{0} LIKE {1} || '%'")),
            (EndsWith, Pattern("{0} LIKE '%' || {1}")),
            (Substring, Render(substring)),
            (Length, Pattern("LENGTH({0})")),
            (IndexOf, Pattern("(STRPOS({0}, {1}) - 1)")),
            (Concat, Render(pipe_concat)),
            (ToString, Pattern("CAST({0} AS VARCHAR)")),
            (Now, Pattern("LOCALTIMESTAMP")),
            (UtcNow, Pattern("(NOW() AT TIME ZONE 'UTC')")),
            (Today, Pattern("CURRENT_DATE")),
            (Date, Pattern("CAST({0} AS DATE)")),
            (Year, Pattern("EXTRACT(YEAR FROM {0})")),
            (Month, Pattern("EXTRACT(MONTH FROM {0})")),
            (Day, Pattern("EXTRACT(DAY FROM {0})")),
            (Hour, Pattern("EXTRACT(HOUR FROM {0})")),
            (Minute, Pattern("EXTRACT(MINUTE FROM {0})")),
            (Second, Pattern("FLOOR(EXTRACT(SECOND FROM {0}))")),
            (DayOfWeek, Pattern("EXTRACT(DOW FROM {0})")),
            (AddYears, Pattern("({0} + {1} * INTERVAL '1 year')")),
            (AddMonths, Pattern("({0} + {1} * INTERVAL '1 month')")),
            (AddDays, Pattern("({0} + {1} * INTERVAL '1 day')")),
            (AddHours, Pattern("({0} + {1} * INTERVAL '1 hour')")),
            (AddMinutes, Pattern("({0} + {1} * INTERVAL '1 minute')")),
            (AddSeconds, Pattern("({0} + {1} * INTERVAL '1 second')")),
            (Ceiling, Pattern("CEIL({0})")),
            (Truncate, Pattern("TRUNC({0})")),
            (NewGuid, Pattern("GEN_RANDOM_UUID()")),
        ]);
        Self { functions }
    }
}

fn substring(args: &[String]) -> String {
    match args {
        [s, start] => format!("SUBSTRING({} FROM {} + 1)", s, start),
        [s, start, len, ..] => format!("SUBSTRING({} FROM {} + 1 FOR {})", s, start, len),
        _ => String::new(),
    }
}

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn name(&self) -> &'static str {
        "postgres"
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
        let digits = || datetime_digits(hint, config, 6, 6);
        match value {
            DbValue::Null => self.null_literal().to_string(),
            DbValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            DbValue::Int(i) => i.to_string(),
            DbValue::Float(f) => f.to_string(),
            DbValue::Decimal(d) => d.clone(),
            DbValue::String(s) => quote_string(s, false),
            DbValue::Bytes(b) => format!("'\\x{}'::bytea", hex(b)),
            DbValue::Guid(g) => format!("'{}'::uuid", g),
            DbValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            DbValue::Time(t) => format!("TIME '{}'", format_time(t, digits())),
            DbValue::DateTime(dt) => format!("TIMESTAMP '{}'", format_datetime(dt, digits())),
            DbValue::DateTimeOffset(dt) => format!(
                "TIMESTAMPTZ '{}{}'",
                format_datetime(&dt.naive_local(), digits()),
                format_offset(dt.offset())
            ),
        }
    }

    fn identity_retrieval(&self, table: &str, column: &str) -> IdentityRetrieval {
        IdentityRetrieval::Select(format!(
            "SELECT CURRVAL('{}_{}_seq') AS {}",
            table, column, self.quote(IDENTITY_COLUMN)
        ))
    }

    fn page_suffix(&self, skip: u64, take: u64) -> Option<String> {
        match (skip, take) {
            (0, 0) => None,
            (0, take) => Some(format!("LIMIT {}", take)),
            (skip, 0) => Some(format!("OFFSET {}", skip)),
            (skip, take) => Some(format!("LIMIT {} OFFSET {}", take, skip)),
        }
    }
}
