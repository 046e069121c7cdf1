use crate::{
    config::CompilerConfig,
    dialect::{
        datetime_digits, format_datetime, format_offset, format_time, hex, pipe_concat, quote_string,
        Dialect, DialectKind, FunctionTable, FunctionTemplate, IdentityRetrieval, Intrinsic, IDENTITY_COLUMN,
    },
    metadata::ColumnMeta,
    value::DbValue,
};

const ROW_NUMBER_COLUMN: &str = "\"RowNumber__\"";

pub struct Oracle {
    functions: FunctionTable,
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle {
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
            // empty strings are NULL in Oracle
            (IsNullOrEmpty, Pattern("{0} IS NULL")),
            (ToString, Pattern("TO_CHAR({0})")),
            (Now, Pattern("LOCALTIMESTAMP")),
            (UtcNow, Pattern("SYS_EXTRACT_UTC(SYSTIMESTAMP)")),
            (Today, Pattern("TRUNC(SYSDATE)")),
            (Date, Pattern("TRUNC({0})")),
            (Year, Pattern("EXTRACT(YEAR FROM {0})")),
            (Month, Pattern("EXTRACT(MONTH FROM {0})")),
            (Day, Pattern("EXTRACT(DAY FROM {0})")),
            (Hour, Pattern("EXTRACT(HOUR FROM CAST({0} AS TIMESTAMP))")),
            (Minute, Pattern("EXTRACT(MINUTE FROM CAST({0} AS TIMESTAMP))")),
            (Second, Pattern("FLOOR(EXTRACT(SECOND FROM CAST({0} AS TIMESTAMP)))")),
            (DayOfWeek, Pattern("(TO_NUMBER(TO_CHAR({0}, 'D')) - 1)")),
            (AddYears, Pattern("ADD_MONTHS({0}, {1} * 12)")),
            (AddMonths, Pattern("ADD_MONTHS({0}, {1})")),
            (AddDays, Pattern("({0} + NUMTODSINTERVAL({1}, 'DAY'))")),
            (AddHours, Pattern("({0} + NUMTODSINTERVAL({1}, 'HOUR'))")),
            (AddMinutes, Pattern("({0} + NUMTODSINTERVAL({1}, 'MINUTE'))")),
            (AddSeconds, Pattern("({0} + NUMTODSINTERVAL({1}, 'SECOND'))")),
            (Ceiling, Pattern("CEIL({0})")),
            (Truncate, Pattern("TRUNC({0})")),
            (Modulo, Pattern("MOD({0}, {1})")),
            (Coalesce, Pattern("NVL({0}, {1})")),
            (NewGuid, Pattern("SYS_GUID()")),
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

fn timestamp_format(digits: u8) -> &'static str {
    if digits == 0 { "YYYY-MM-DD HH24:MI:SS" } else { "YYYY-MM-DD HH24:MI:SS.FF" }
}

impl Dialect for Oracle {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn parameter_prefix(&self) -> &'static str {
        ":"
    }

    fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    fn render_literal(&self, value: &DbValue, hint: Option<&ColumnMeta>, config: &CompilerConfig) -> String {
        let digits = datetime_digits(hint, config, 6, 7);
        match value {
            DbValue::Null => self.null_literal().to_string(),
            DbValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            DbValue::Int(i) => i.to_string(),
            DbValue::Float(f) => f.to_string(),
            DbValue::Decimal(d) => d.clone(),
            DbValue::String(s) => quote_string(s, false),
            DbValue::Bytes(b) => format!("HEXTORAW('{}')", hex(b)),
            DbValue::Guid(g) => format!("HEXTORAW('{}')", hex(g.as_bytes())),
            DbValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            DbValue::Time(t) => format!("TO_DSINTERVAL('0 {}')", format_time(t, digits)),
            DbValue::DateTime(dt) => format!(
                "TO_TIMESTAMP('{}', '{}')",
                format_datetime(dt, digits),
                timestamp_format(digits)
            ),
            DbValue::DateTimeOffset(dt) => format!(
                "TO_TIMESTAMP_TZ('{} {}', '{} TZH:TZM')",
                format_datetime(&dt.naive_local(), digits),
                format_offset(dt.offset()),
                timestamp_format(digits)
            ),
        }
    }

    /// Generated ids come back through an output parameter.
    fn identity_retrieval(&self, _table: &str, column: &str) -> IdentityRetrieval {
        let parameter = format!("{}{}", self.parameter_prefix(), IDENTITY_COLUMN);
        IdentityRetrieval::Returning {
            clause: format!("RETURNING {} INTO {}", self.quote(column), parameter),
            parameter,
        }
    }

    fn page_suffix(&self, _skip: u64, _take: u64) -> Option<String> {
        None
    }

    fn page_wrap(&self, sql: String, skip: u64, take: u64) -> String {
        match (skip, take) {
            (0, 0) => sql,
            (0, take) => format!("SELECT * FROM (\n{}\n) r0 WHERE ROWNUM <= {}", sql, take),
            (skip, 0) => format!(
                "SELECT * FROM (\nSELECT r0.*, ROWNUM AS {rn} FROM (\n{sql}\n) r0\n) r1 WHERE r1.{rn} > {skip}",
                rn = ROW_NUMBER_COLUMN, sql = sql, skip = skip
            ),
            (skip, take) => format!(
                "SELECT * FROM (\nSELECT r0.*, ROWNUM AS {rn} FROM (\n{sql}\n) r0 WHERE ROWNUM <= {last}\n) r1 WHERE r1.{rn} > {skip}",
                rn = ROW_NUMBER_COLUMN, sql = sql, last = skip.saturating_add(take), skip = skip
            ),
        }
    }

    fn exists_wrap(&self, inner: &str) -> String {
        format!("SELECT CASE WHEN EXISTS(\n{}\n) THEN 1 ELSE 0 END FROM DUAL", inner)
    }

    fn dummy_from(&self) -> Option<&'static str> {
        Some("DUAL")
    }

    fn multi_row_insert(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rownum_wrapping() {
        let d = Oracle::new();
        assert_eq!(d.page_wrap("SELECT 1 FROM DUAL".into(), 0, 0), "SELECT 1 FROM DUAL");
        let paged = d.page_wrap("SELECT x".into(), 5, 10);
        assert!(paged.contains("WHERE ROWNUM <= 15"));
        assert!(paged.ends_with("WHERE r1.\"RowNumber__\" > 5"));
        assert!(d.page_wrap("SELECT x".into(), 0, 3).ends_with("WHERE ROWNUM <= 3"));
    }

    #[test]
    fn huge_pages_saturate() {
        let paged = Oracle::new().page_wrap("SELECT x".into(), u64::MAX, 1);
        assert!(paged.contains(&format!("WHERE ROWNUM <= {}", u64::MAX)));
        assert!(paged.ends_with(&format!("> {}", u64::MAX)));
    }

    #[test]
    fn timestamps_carry_a_format_mask() {
        let d = Oracle::new();
        let dt = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap();
        let c = CompilerConfig::default().with_datetime_precision(0);
        assert_eq!(
            d.render_literal(&DbValue::DateTime(dt), None, &c),
            "TO_TIMESTAMP('2021-03-04 05:06:07', 'YYYY-MM-DD HH24:MI:SS')"
        );
    }

    #[test]
    fn identity_uses_returning_into() {
        match Oracle::new().identity_retrieval("ORDERS", "ID") {
            IdentityRetrieval::Returning { clause, parameter } => {
                assert_eq!(clause, "RETURNING \"ID\" INTO :AutoId");
                assert_eq!(parameter, ":AutoId");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
