use chrono::{Datelike, NaiveDate};

/// Accepted date layouts, tried in order. Numeric forms other than ISO are
/// day-first, matching how the dealership sheet is filled in.
const FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %Y",
];

/// Parse a sheet date cell into a comparable date.
///
/// A trailing time component (`T10:00:00`, ` 10:00:00 AM`) is ignored. Years
/// outside 1900..=2100 are treated as a mis-parse, which keeps `%Y` from
/// swallowing a two-digit year.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let date = strip_time(raw.trim());
    if date.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&date, fmt).ok())
        .find(|d| (1900..=2100).contains(&d.year()))
}

fn strip_time(s: &str) -> String {
    let mut tokens = s.split_whitespace();
    let mut kept: Vec<&str> = tokens.next().into_iter().collect();
    kept.extend(tokens.take_while(|token| !token.contains(':')));
    let date = kept.join(" ");
    match date.split_once('T') {
        Some((day, time)) if time.contains(':') => day.to_string(),
        _ => date,
    }
}
