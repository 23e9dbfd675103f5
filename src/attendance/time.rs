use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::attendance::error::AttendanceError;

/// Naive layouts accepted for a clock-out timestamp; all are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

/// Whole minutes between two instants, rounded to nearest. Negative spans
/// clamp to zero.
pub fn rounded_minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
    if minutes <= 0.0 {
        0
    } else {
        minutes.round() as u32
    }
}

/// Parse an ISO-8601 instant. `Z` and numeric offsets are honoured,
/// naive input is taken as UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, AttendanceError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    // offset without seconds, e.g. 2026-01-05T18:00+09:00
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%MZ"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AttendanceError::InvalidTimestamp(raw.to_string()))
}

/// First and last calendar day of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AttendanceError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(AttendanceError::InvalidMonth(month))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or(AttendanceError::InvalidMonth(month))?;

    debug_assert_eq!(first.month(), last.month());
    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, s).unwrap()
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(8.416_666), 8.42);
        assert_eq!(round2(7.083_333), 7.08);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn hours_between_uses_fractional_hours() {
        let hours = hours_between(utc(9, 5, 0), utc(18, 30, 0));
        assert!((hours - 9.416_666).abs() < 1e-4);
    }

    #[test]
    fn minutes_round_to_nearest_and_clamp() {
        assert_eq!(rounded_minutes_between(utc(12, 0, 0), utc(12, 14, 29)), 14);
        assert_eq!(rounded_minutes_between(utc(12, 0, 0), utc(12, 14, 31)), 15);
        assert_eq!(rounded_minutes_between(utc(12, 0, 0), utc(11, 0, 0)), 0);
    }

    #[test]
    fn parses_zulu_suffix() {
        assert_eq!(parse_instant("2026-01-05T18:30:00Z").unwrap(), utc(18, 30, 0));
    }

    #[test]
    fn parses_numeric_offset_into_utc() {
        assert_eq!(parse_instant("2026-01-05T18:30:00+09:00").unwrap(), utc(9, 30, 0));
        assert_eq!(parse_instant("2026-01-05T18:30+09:00").unwrap(), utc(9, 30, 0));
    }

    #[test]
    fn naive_input_is_utc() {
        assert_eq!(parse_instant("2026-01-05T18:30:00").unwrap(), utc(18, 30, 0));
        assert_eq!(parse_instant("2026-01-05 18:30:00.250").unwrap().timestamp(), utc(18, 30, 0).timestamp());
        assert_eq!(parse_instant("2026-01-05T18:30").unwrap(), utc(18, 30, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_instant("yesterday"),
            Err(AttendanceError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn month_bounds_handle_leap_years_and_december() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2025, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!(matches!(month_bounds(2025, 13), Err(AttendanceError::InvalidMonth(13))));
        assert!(matches!(month_bounds(2025, 0), Err(AttendanceError::InvalidMonth(0))));
    }
}
