use chrono::{FixedOffset, NaiveDateTime, NaiveTime, Timelike};

use crate::{config::CompilerConfig, metadata::{ColumnMeta, DbType}};

/// `'it''s'`. MySQL additionally treats backslash as an escape character.
pub fn quote_string(s: &str, escape_backslash: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' if escape_backslash => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn fraction(nanos: u32, digits: u8) -> String {
    if digits == 0 {
        return String::new();
    }
    let digits = digits.min(9) as u32;
    // leap-second nanos may exceed 1e9
    let nanos = nanos % 1_000_000_000;
    let value = nanos / 10u32.pow(9 - digits);
    format!(".{:0width$}", value, width = digits as usize)
}

pub fn format_datetime(dt: &NaiveDateTime, digits: u8) -> String {
    format!("{}{}", dt.format("%Y-%m-%d %H:%M:%S"), fraction(dt.nanosecond(), digits))
}

pub fn format_time(t: &NaiveTime, digits: u8) -> String {
    format!("{}{}", t.format("%H:%M:%S"), fraction(t.nanosecond(), digits))
}

/// `+08:00` / `-03:30`.
pub fn format_offset(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Fractional-second digits for a datetime literal: column scale, then configuration,
/// then the dialect default. Legacy `DateTime` columns never exceed milliseconds.
pub fn datetime_digits(hint: Option<&ColumnMeta>, config: &CompilerConfig, default: u8, max: u8) -> u8 {
    let hinted = hint.filter(|c| c.db_type.is_temporal()).and_then(|c| c.scale);
    let digits = hinted.or(config.datetime_precision).unwrap_or(default).min(max);
    match hint.map(|c| c.db_type) {
        Some(DbType::DateTime) => digits.min(3),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quote_string("it's", false), "'it''s'");
        assert_eq!(quote_string(r"a\b", true), r"'a\\b'");
        assert_eq!(quote_string(r"a\b", false), r"'a\b'");
    }

    #[test]
    fn datetime_fraction_is_truncated_to_precision() {
        let dt = NaiveDate::from_ymd_opt(2019, 10, 5).unwrap().and_hms_nano_opt(8, 9, 10, 123_456_789).unwrap();
        assert_eq!(format_datetime(&dt, 3), "2019-10-05 08:09:10.123");
        assert_eq!(format_datetime(&dt, 7), "2019-10-05 08:09:10.1234567");
        assert_eq!(format_datetime(&dt, 0), "2019-10-05 08:09:10");
    }

    #[test]
    fn offsets_and_hex() {
        assert_eq!(format_offset(&FixedOffset::east_opt(8 * 3600).unwrap()), "+08:00");
        assert_eq!(format_offset(&FixedOffset::west_opt(3 * 3600 + 1800).unwrap()), "-03:30");
        assert_eq!(hex(&[0x0a, 0xff]), "0AFF");
    }

    #[test]
    fn digits_prefer_column_scale() {
        let config = CompilerConfig::default().with_datetime_precision(5);
        let col = ColumnMeta::new("At", DbType::DateTime2).scale(2);
        assert_eq!(datetime_digits(Some(&col), &config, 7, 7), 2);
        assert_eq!(datetime_digits(None, &config, 7, 7), 5);
        assert_eq!(datetime_digits(None, &CompilerConfig::default(), 6, 6), 6);
        let legacy = ColumnMeta::new("At", DbType::DateTime);
        assert_eq!(datetime_digits(Some(&legacy), &CompilerConfig::default(), 7, 7), 3);
    }
}
