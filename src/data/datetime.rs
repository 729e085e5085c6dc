use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::CellValue;

/// Date-time layouts tried in order after RFC 3339 / RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Date-only layouts; month-first wins for ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Year-month layouts; the value resolves to the first day of the month.
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%b %Y", "%B %Y"];

/// Parse a date or date-time string with a permissive set of layouts.
///
/// Zoned inputs are converted to naive UTC. Date-only inputs become midnight,
/// year-month inputs midnight on the first of the month.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            let first_of_month = format!("{s}-01");
            MONTH_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&first_of_month, &format!("{fmt}-%d")).ok())
        })
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Interpret a cell as a date-time. Only text and native date-time cells qualify.
pub fn parse_cell(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => parse_datetime(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_iso_dates_and_datetimes() {
        assert_eq!(parse_datetime("2024-01-15"), Some(ymd_hms(2024, 1, 15, 0, 0, 0)));
        assert_eq!(
            parse_datetime("2024-01-15 08:30:00"),
            Some(ymd_hms(2024, 1, 15, 8, 30, 0))
        );
        assert_eq!(
            parse_datetime(" 2024-01-15T08:30 "),
            Some(ymd_hms(2024, 1, 15, 8, 30, 0))
        );
    }

    #[test]
    fn converts_zoned_inputs_to_utc() {
        assert_eq!(
            parse_datetime("2024-01-15T10:00:00+02:00"),
            Some(ymd_hms(2024, 1, 15, 8, 0, 0))
        );
    }

    #[test]
    fn prefers_month_first_for_slash_dates() {
        assert_eq!(parse_datetime("03/04/2024"), Some(ymd_hms(2024, 3, 4, 0, 0, 0)));
        // Day 25 cannot be a month, so the day-first layout applies.
        assert_eq!(parse_datetime("25/04/2024"), Some(ymd_hms(2024, 4, 25, 0, 0, 0)));
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(parse_datetime("March 4, 2024"), Some(ymd_hms(2024, 3, 4, 0, 0, 0)));
        assert_eq!(parse_datetime("4 Mar 2024"), Some(ymd_hms(2024, 3, 4, 0, 0, 0)));
    }

    #[test]
    fn year_month_is_first_of_month() {
        assert_eq!(parse_datetime("2024-01"), Some(ymd_hms(2024, 1, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("2024/11"), Some(ymd_hms(2024, 11, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("Feb 2024"), Some(ymd_hms(2024, 2, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("September 2023"), Some(ymd_hms(2023, 9, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("2024-13"), None);
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_datetime("Alice"), None);
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
        assert_eq!(parse_cell(&CellValue::Integer(20240101)), None);
    }
}
