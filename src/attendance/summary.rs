use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::time::round2;
use crate::model::attendance::AttendanceRecord;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SummaryTotals {
    #[schema(example = 20)]
    pub total_work_days: u32,
    #[schema(example = 162.5)]
    pub total_work_hours: f64,
    #[schema(example = 4.25)]
    pub total_overtime_hours: f64,
    #[schema(example = 8.13)]
    pub average_daily_hours: f64,
}

#[derive(Debug, Clone)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub totals: SummaryTotals,
    /// Date descending.
    pub records: Vec<AttendanceRecord>,
}

/// Fold a set of day records into totals. A day counts as worked once it
/// has a clock-in, whether or not it was closed.
pub fn summarize(records: &[AttendanceRecord]) -> SummaryTotals {
    let total_work_days = records.iter().filter(|r| r.is_clocked_in()).count() as u32;
    let total_work_hours: f64 = records.iter().map(|r| r.total_hours).sum();
    let total_overtime_hours: f64 = records.iter().map(|r| r.overtime_hours).sum();

    let average_daily_hours = if total_work_days > 0 {
        total_work_hours / f64::from(total_work_days)
    } else {
        0.0
    };

    SummaryTotals {
        total_work_days,
        total_work_hours: round2(total_work_hours),
        total_overtime_hours: round2(total_overtime_hours),
        average_daily_hours: round2(average_daily_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32, hours: f64, overtime: f64, clocked_in: bool) -> AttendanceRecord {
        let now = Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap();
        let mut record = AttendanceRecord::new(u64::from(d), 1, NaiveDate::from_ymd_opt(2026, 1, d).unwrap(), 60, now);
        record.total_hours = hours;
        record.overtime_hours = overtime;
        if clocked_in {
            record.clock_in = Some(now);
        } else {
            record.status = AttendanceStatus::Absent;
        }
        record
    }

    #[test]
    fn absent_days_do_not_count() {
        let records = vec![day(3, 8.0, 0.0, true), day(2, 7.5, 0.0, true), day(1, 0.0, 0.0, false)];
        let totals = summarize(&records);

        assert_eq!(totals.total_work_days, 2);
        assert_eq!(totals.total_work_hours, 15.5);
        assert_eq!(totals.total_overtime_hours, 0.0);
        assert_eq!(totals.average_daily_hours, 7.75);
    }

    #[test]
    fn open_day_counts_as_worked_with_zero_hours() {
        let records = vec![day(2, 0.0, 0.0, true), day(1, 9.5, 1.5, true)];
        let totals = summarize(&records);

        assert_eq!(totals.total_work_days, 2);
        assert_eq!(totals.total_overtime_hours, 1.5);
        assert_eq!(totals.average_daily_hours, 4.75);
    }

    #[test]
    fn empty_month_averages_zero() {
        let totals = summarize(&[]);
        assert_eq!(totals.total_work_days, 0);
        assert_eq!(totals.average_daily_hours, 0.0);
    }

    #[test]
    fn sums_are_rounded() {
        let records = vec![day(1, 8.333, 0.333, true), day(2, 8.333, 0.333, true), day(3, 8.333, 0.333, true)];
        let totals = summarize(&records);

        assert_eq!(totals.total_work_hours, 25.0);
        assert_eq!(totals.total_overtime_hours, 1.0);
        assert_eq!(totals.average_daily_hours, 8.33);
    }
}
