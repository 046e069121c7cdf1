use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Closed set of operations the translators can map to dialect SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Contains,
    StartsWith,
    EndsWith,
    Substring,
    Length,
    ToUpper,
    ToLower,
    Trim,
    TrimStart,
    TrimEnd,
    Replace,
    IndexOf,
    Concat,
    IsNullOrEmpty,
    ToString,
    Now,
    UtcNow,
    Today,
    Date,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DayOfWeek,
    AddYears,
    AddMonths,
    AddDays,
    AddHours,
    AddMinutes,
    AddSeconds,
    Abs,
    Round,
    Ceiling,
    Floor,
    Truncate,
    Power,
    Modulo,
    Coalesce,
    NewGuid,
}

static BY_NAME: Lazy<HashMap<String, Intrinsic>> = Lazy::new(|| {
    use Intrinsic::*;
    let entries = [
        ("contains", Contains),
        ("startswith", StartsWith),
        ("endswith", EndsWith),
        ("substring", Substring),
        ("length", Length),
        ("toupper", ToUpper),
        ("tolower", ToLower),
        ("trim", Trim),
        ("trimstart", TrimStart),
        ("trimend", TrimEnd),
        ("replace", Replace),
        ("indexof", IndexOf),
        ("concat", Concat),
        ("isnullorempty", IsNullOrEmpty),
        ("tostring", ToString),
        ("now", Now),
        ("utcnow", UtcNow),
        ("today", Today),
        ("date", Date),
        ("year", Year),
        ("month", Month),
        ("day", Day),
        ("hour", Hour),
        ("minute", Minute),
        ("second", Second),
        ("dayofweek", DayOfWeek),
        ("addyears", AddYears),
        ("addmonths", AddMonths),
        ("adddays", AddDays),
        ("addhours", AddHours),
        ("addminutes", AddMinutes),
        ("addseconds", AddSeconds),
        ("abs", Abs),
        ("round", Round),
        ("ceiling", Ceiling),
        ("floor", Floor),
        ("truncate", Truncate),
        ("pow", Power),
        ("power", Power),
        ("coalesce", Coalesce),
        ("newguid", NewGuid),
    ];
    entries.into_iter().map(|(n, i)| (n.to_string(), i)).collect()
});

impl Intrinsic {
    /// Case-insensitive lookup of a method or member name.
    pub fn resolve(name: &str) -> Option<Intrinsic> {
        BY_NAME.get(&name.to_ascii_lowercase()).copied()
    }

    /// Accepted argument counts, receiver included. `usize::MAX` means variadic.
    pub fn arity(&self) -> (usize, usize) {
        use Intrinsic::*;
        match self {
            Now | UtcNow | Today | NewGuid => (0, 0),
            Length | ToUpper | ToLower | Trim | TrimStart | TrimEnd | IsNullOrEmpty | ToString
            | Date | Year | Month | Day | Hour | Minute | Second | DayOfWeek
            | Abs | Ceiling | Floor | Truncate => (1, 1),
            Round => (1, 2),
            Substring => (2, 3),
            Contains | StartsWith | EndsWith | IndexOf | Power | Modulo | Coalesce
            | AddYears | AddMonths | AddDays | AddHours | AddMinutes | AddSeconds => (2, 2),
            Replace => (3, 3),
            Concat => (2, usize::MAX),
        }
    }

    pub fn arity_text(&self) -> String {
        match self.arity() {
            (min, max) if min == max => min.to_string(),
            (min, usize::MAX) => format!("at least {}", min),
            (min, max) => format!("{} to {}", min, max),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && count <= max
    }

    /// Whether the rendered SQL is a predicate rather than a value.
    pub fn is_predicate(&self) -> bool {
        matches!(self, Intrinsic::Contains | Intrinsic::StartsWith | Intrinsic::EndsWith | Intrinsic::IsNullOrEmpty)
    }
}
