use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Working-day rules every transition is evaluated against.
#[derive(Debug, Clone)]
pub struct WorkPolicy {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub regular_hours: f64,
    pub default_break_minutes: u32,
    /// Office time zone; "today" and time-of-day checks follow its DST rules.
    pub timezone: Tz,
}

impl Default for WorkPolicy {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::MIN + Duration::hours(9),
            work_end: NaiveTime::MIN + Duration::hours(18),
            regular_hours: 8.0,
            default_break_minutes: 60,
            timezone: Tz::UTC,
        }
    }
}

impl WorkPolicy {
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.timezone).time()
    }

    pub fn is_late(&self, clock_in: DateTime<Utc>) -> bool {
        self.local_time(clock_in) > self.work_start
    }

    pub fn leaves_early(&self, clock_out: DateTime<Utc>) -> bool {
        self.local_time(clock_out) < self.work_end
    }
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .with_context(|| format!("invalid time of day: {raw}"))
}

/// IANA zone name such as `Asia/Tokyo` or `America/New_York`.
pub fn parse_timezone(raw: &str) -> Result<Tz> {
    let raw = raw.trim();
    raw.parse::<Tz>()
        .map_err(|e| anyhow!("invalid time zone {raw}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_day_follows_timezone() {
        let policy = WorkPolicy {
            timezone: chrono_tz::Asia::Tokyo,
            ..WorkPolicy::default()
        };
        // 2026-01-05 20:00 UTC is already the 6th in Tokyo
        let instant = Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap();
        assert_eq!(policy.local_date(instant), NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(policy.local_time(instant), NaiveTime::from_hms_opt(5, 0, 0).unwrap());
    }

    #[test]
    fn lateness_follows_daylight_saving() {
        let policy = WorkPolicy {
            timezone: parse_timezone("America/New_York").unwrap(),
            ..WorkPolicy::default()
        };
        // 13:30 UTC is 09:30 EDT in July but 08:30 EST in January
        let summer = Utc.with_ymd_and_hms(2026, 7, 6, 13, 30, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2026, 1, 5, 13, 30, 0).unwrap();

        assert_eq!(policy.local_time(summer), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(policy.is_late(summer));
        assert_eq!(policy.local_time(winter), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(!policy.is_late(winter));
    }

    #[test]
    fn lateness_is_strictly_after_start() {
        let policy = WorkPolicy::default();
        let at = |h, m| Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap();
        assert!(!policy.is_late(at(9, 0)));
        assert!(policy.is_late(at(9, 1)));
        assert!(policy.leaves_early(at(17, 59)));
        assert!(!policy.leaves_early(at(18, 0)));
    }

    #[test]
    fn parses_zone_names() {
        assert_eq!(parse_timezone("Asia/Tokyo").unwrap(), chrono_tz::Asia::Tokyo);
        assert_eq!(parse_timezone(" UTC ").unwrap(), Tz::UTC);
        assert!(parse_timezone("+09:00").is_err());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn parses_times_of_day() {
        assert_eq!(parse_time_of_day("09:00").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(parse_time_of_day("18:00:30").unwrap(), NaiveTime::from_hms_opt(18, 0, 30).unwrap());
        assert!(parse_time_of_day("6pm").is_err());
    }
}
