use crate::{
    config::CompilerConfig,
    dialect::{
        datetime_digits, format_datetime, format_time, hex, quote_string,
        Dialect, DialectKind, DmlStyle, FunctionTable, FunctionTemplate, IdentityRetrieval, Intrinsic, IDENTITY_COLUMN,
    },
    metadata::ColumnMeta,
    value::DbValue,
};

pub struct MySql {
    functions: FunctionTable,
}

impl Default for MySql {
    fn default() -> Self {
        Self::new()
    }
}

impl MySql {
    pub fn new() -> Self {
        use FunctionTemplate::{Pattern, Render};
        use Intrinsic::*;
        let functions = FunctionTable::common().with(vec![
            (Contains, Pattern("{0} LIKE CONCAT('%', {1}, '%')")),
            (StartsWith, Pattern("{0} LIKE CONCAT({1}, '%')")),
            (EndsWith, Pattern("{0} LIKE CONCAT('%', {1})")),
            (Substring, Render(substring)),
            (Length, Pattern("CHAR_LENGTH({0})")),
            (IndexOf, Pattern("(LOCATE({1}, {0}) - 1)")),
            (Concat, Render(concat)),
            (ToString, Pattern("CAST({0} AS CHAR)")),
            (Now, Pattern("NOW()")),
            (UtcNow, Pattern("UTC_TIMESTAMP()")),
            (Today, Pattern("CURDATE()")),
            (Date, Pattern("DATE({0})")),
            (Year, Pattern("YEAR({0})")),
            (Month, Pattern("MONTH({0})")),
            (Day, Pattern("DAY({0})")),
            (Hour, Pattern("HOUR({0})")),
            (Minute, Pattern("MINUTE({0})")),
            (Second, Pattern("SECOND({0})")),
            (DayOfWeek, Pattern("(DAYOFWEEK({0}) - 1)")),
            (AddYears, Pattern("DATE_ADD({0}, INTERVAL {1} YEAR)")),
            (AddMonths, Pattern("DATE_ADD({0}, INTERVAL {1} MONTH)")),
            (AddDays, Pattern("DATE_ADD({0}, INTERVAL {1} DAY)")),
            (AddHours, Pattern("DATE_ADD({0}, INTERVAL {1} HOUR)")),
            (AddMinutes, Pattern("DATE_ADD({0}, INTERVAL {1} MINUTE)")),
            (AddSeconds, Pattern("DATE_ADD({0}, INTERVAL {1} SECOND)")),
            (Ceiling, Pattern("CEILING({0})")),
            (Truncate, Pattern("TRUNCATE({0}, 0)")),
            (Coalesce, Pattern("IFNULL({0}, {1})")),
            (NewGuid, Pattern("UUID()")),
        ]);
        Self { functions }
    }
}

fn substring(args: &[String]) -> String {
    match args {
        [s, start] => format!("SUBSTRING({}, {} + 1)", s, start),
        [s, start, len, ..] => format!("SUBSTRING({}, {} + 1, {})", s, start, len),
        _ => String::new(),
    }
}

fn concat(args: &[String]) -> String {
    format!("CONCAT({})", args.join(", "))
}

impl Dialect for MySql {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn parameter_prefix(&self) -> &'static str {
        "?"
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
            DbValue::String(s) => quote_string(s, true),
            DbValue::Bytes(b) => format!("X'{}'", hex(b)),
            DbValue::Guid(g) => format!("'{}'", g),
            DbValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            DbValue::Time(t) => format!("'{}'", format_time(t, digits())),
            DbValue::DateTime(dt) => format!("'{}'", format_datetime(dt, digits())),
            // no zone-aware type: store the UTC instant
            DbValue::DateTimeOffset(dt) => format!("'{}'", format_datetime(&dt.naive_utc(), digits())),
        }
    }

    fn identity_retrieval(&self, _table: &str, _column: &str) -> IdentityRetrieval {
        IdentityRetrieval::Select(format!("SELECT LAST_INSERT_ID() AS {}", self.quote(IDENTITY_COLUMN)))
    }

    fn page_suffix(&self, skip: u64, take: u64) -> Option<String> {
        match (skip, take) {
            (0, 0) => None,
            (0, take) => Some(format!("LIMIT {}", take)),
            (skip, 0) => Some(format!("LIMIT {}, 18446744073709551615", skip)),
            (skip, take) => Some(format!("LIMIT {}, {}", skip, take)),
        }
    }

    fn dml_style(&self) -> DmlStyle {
        DmlStyle::UpdateJoin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_are_escaped() {
        let d = MySql::new();
        assert_eq!(d.render_literal(&DbValue::from(r"C:\tmp"), None, &CompilerConfig::default()), r"'C:\\tmp'");
        assert_eq!(d.render_literal(&DbValue::Bool(true), None, &CompilerConfig::default()), "TRUE");
    }

    #[test]
    fn limit_forms() {
        let d = MySql::new();
        assert_eq!(d.page_suffix(0, 10).unwrap(), "LIMIT 10");
        assert_eq!(d.page_suffix(5, 10).unwrap(), "LIMIT 5, 10");
        assert!(d.page_suffix(5, 0).unwrap().starts_with("LIMIT 5, "));
        assert_eq!(d.page_suffix(0, 0), None);
    }

    #[test]
    fn concat_is_a_function() {
        let sql = MySql::new().functions().render(Intrinsic::Concat, &["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(sql, "CONCAT(a, b, c)");
    }
}
