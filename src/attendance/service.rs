use chrono::{Duration, NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

use crate::attendance::error::AttendanceError;
use crate::attendance::policy::WorkPolicy;
use crate::attendance::repository;
use crate::attendance::summary::{MonthlySummary, summarize};
use crate::attendance::time::{month_bounds, parse_instant};
use crate::model::attendance::AttendanceRecord;
use crate::model::break_record::BreakRecord;

/// Days covered by the history view when no month is given.
const RECENT_DAYS: i64 = 30;

#[instrument(skip(pool, policy, notes))]
pub async fn clock_in(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
    notes: Option<String>,
    break_minutes: Option<u32>,
) -> Result<AttendanceRecord, AttendanceError> {
    let now = Utc::now();
    let today = policy.local_date(now);
    let break_minutes = break_minutes.unwrap_or(policy.default_break_minutes);

    let mut tx = pool.begin().await?;

    if repository::find_record(&mut *tx, user_id, today).await?.is_none() {
        match repository::create_record(&mut tx, user_id, today, break_minutes, now).await {
            Ok(record) => debug!(record_id = record.id, "Created attendance record"),
            Err(e) if repository::is_unique_violation(&e) => {
                debug!("Attendance record created concurrently, reusing it");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut record = repository::find_record_for_update(&mut tx, user_id, today)
        .await?
        .ok_or(AttendanceError::NoRecordFound)?;

    record.clock_in(policy, now, notes, break_minutes)?;
    repository::save_record(&mut tx, &record).await?;
    tx.commit().await?;

    info!(record_id = record.id, status = %record.status, "Clocked in");
    Ok(record)
}

#[instrument(skip(pool, policy, notes))]
pub async fn clock_out(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
    clock_out: &str,
    break_minutes: Option<u32>,
    notes: Option<String>,
) -> Result<AttendanceRecord, AttendanceError> {
    let at = parse_instant(clock_out)?;
    let now = Utc::now();
    let today = policy.local_date(now);

    let mut tx = pool.begin().await?;
    let mut record = repository::find_record_for_update(&mut tx, user_id, today)
        .await?
        .ok_or(AttendanceError::NoRecordFound)?;

    let open_break = if record.is_on_break() {
        repository::find_open_break(&mut tx, record.id).await?
    } else {
        None
    };

    let closed_break = record.clock_out(policy, at, break_minutes, notes, open_break, now)?;
    if let Some(closed) = &closed_break {
        repository::save_break(&mut tx, closed).await?;
        debug!(break_id = closed.id, "Closed open break at clock-out");
    }
    repository::save_record(&mut tx, &record).await?;
    tx.commit().await?;

    info!(
        record_id = record.id,
        total_hours = record.total_hours,
        overtime_hours = record.overtime_hours,
        status = %record.status,
        "Clocked out"
    );
    Ok(record)
}

#[instrument(skip(pool, policy))]
pub async fn cancel_clock_out(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
) -> Result<AttendanceRecord, AttendanceError> {
    let now = Utc::now();
    let today = policy.local_date(now);

    let mut tx = pool.begin().await?;
    let mut record = repository::find_record_for_update(&mut tx, user_id, today)
        .await?
        .ok_or(AttendanceError::NoRecordFound)?;

    record.cancel_clock_out(policy, now)?;
    repository::save_record(&mut tx, &record).await?;
    tx.commit().await?;

    info!(record_id = record.id, status = %record.status, "Clock-out cancelled");
    Ok(record)
}

#[instrument(skip(pool, policy, notes))]
pub async fn start_break(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
    notes: Option<String>,
) -> Result<(AttendanceRecord, BreakRecord), AttendanceError> {
    let now = Utc::now();
    let today = policy.local_date(now);

    let mut tx = pool.begin().await?;
    let mut record = repository::find_record_for_update(&mut tx, user_id, today)
        .await?
        .ok_or(AttendanceError::NoRecordFound)?;

    let new_break = record.start_break(now, notes)?;
    let brk = repository::create_break(&mut tx, &new_break).await?;
    repository::save_record(&mut tx, &record).await?;
    tx.commit().await?;

    info!(record_id = record.id, break_id = brk.id, "Break started");
    Ok((record, brk))
}

#[instrument(skip(pool, policy, notes))]
pub async fn end_break(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
    notes: Option<String>,
) -> Result<(AttendanceRecord, BreakRecord), AttendanceError> {
    let now = Utc::now();
    let today = policy.local_date(now);

    let mut tx = pool.begin().await?;
    let mut record = repository::find_record_for_update(&mut tx, user_id, today)
        .await?
        .ok_or(AttendanceError::NoRecordFound)?;

    let open_break = if record.is_on_break() {
        repository::find_open_break(&mut tx, record.id).await?
    } else {
        None
    };

    let brk = record.end_break(open_break, now, notes)?;
    repository::save_break(&mut tx, &brk).await?;
    repository::save_record(&mut tx, &record).await?;
    tx.commit().await?;

    info!(
        record_id = record.id,
        break_id = brk.id,
        duration_minutes = brk.duration_minutes,
        "Break ended"
    );
    Ok((record, brk))
}

/// Today's record, if any, with its breaks in start order.
pub async fn today(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
) -> Result<Option<(AttendanceRecord, Vec<BreakRecord>)>, AttendanceError> {
    let today = policy.local_date(Utc::now());

    match repository::find_record(pool, user_id, today).await? {
        Some(record) => {
            let breaks = repository::list_breaks(pool, record.id).await?;
            Ok(Some((record, breaks)))
        }
        None => Ok(None),
    }
}

/// Today's record without its breaks; `None` means the day has not started.
pub async fn current_record(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
) -> Result<Option<AttendanceRecord>, AttendanceError> {
    repository::find_record(pool, user_id, policy.local_date(Utc::now())).await
}

pub async fn get_user_records(
    pool: &MySqlPool,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, AttendanceError> {
    if start_date > end_date {
        return Err(AttendanceError::InvalidDateRange);
    }
    repository::find_records(pool, user_id, start_date, end_date).await
}

pub async fn get_recent_records(
    pool: &MySqlPool,
    policy: &WorkPolicy,
    user_id: u64,
) -> Result<Vec<AttendanceRecord>, AttendanceError> {
    let end = policy.local_date(Utc::now());
    let start = end - Duration::days(RECENT_DAYS - 1);
    repository::find_records(pool, user_id, start, end).await
}

pub async fn get_monthly_summary(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<MonthlySummary, AttendanceError> {
    let (first_day, last_day) = month_bounds(year, month)?;
    let records = get_user_records(pool, user_id, first_day, last_day).await?;
    let totals = summarize(&records);

    debug!(user_id, year, month, days = totals.total_work_days, "Monthly summary computed");
    Ok(MonthlySummary {
        year,
        month,
        totals,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::users::{self, NewUser};
    use crate::model::attendance::BreakStatus;
    use crate::model::role::Role;
    use chrono::Datelike;

    async fn seed_user(pool: &MySqlPool, email: &str) -> u64 {
        users::insert(
            pool,
            &NewUser {
                email,
                password_hash: "x",
                first_name: "Jane",
                last_name: "Doe",
                role: Role::Employee,
                department: None,
                employee_code: None,
            },
        )
        .await
        .unwrap()
    }

    async fn record_count(pool: &MySqlPool, user_id: u64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn concurrent_clock_ins_share_one_record(pool: MySqlPool) {
        let policy = WorkPolicy::default();
        let user_id = seed_user(&pool, "jane@company.com").await;

        let (a, b) = futures::join!(
            clock_in(&pool, &policy, user_id, None, None),
            clock_in(&pool, &policy, user_id, None, None),
        );

        let (won, lost) = match (a, b) {
            (Ok(record), Err(e)) | (Err(e), Ok(record)) => (record, e),
            other => panic!("expected exactly one clock-in to win, got {other:?}"),
        };
        assert!(matches!(lost, AttendanceError::AlreadyClockedIn));
        assert!(won.is_clocked_in());
        assert_eq!(record_count(&pool, user_id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn break_writes_row_and_parent_status_together(pool: MySqlPool) {
        let policy = WorkPolicy::default();
        let user_id = seed_user(&pool, "jane@company.com").await;
        let record = clock_in(&pool, &policy, user_id, None, Some(45)).await.unwrap();
        assert_eq!(record.break_minutes, 45);

        let (_, started) = start_break(&pool, &policy, user_id, Some("Lunch".into())).await.unwrap();
        let (stored, breaks) = today(&pool, &policy, user_id).await.unwrap().unwrap();
        assert_eq!(stored.break_status, BreakStatus::OnBreak);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].id, started.id);
        assert!(breaks[0].is_active());
        assert_eq!(breaks[0].notes.as_deref(), Some("Lunch"));

        assert!(matches!(
            start_break(&pool, &policy, user_id, None).await,
            Err(AttendanceError::AlreadyOnBreak)
        ));

        let (_, ended) = end_break(&pool, &policy, user_id, None).await.unwrap();
        let (stored, breaks) = today(&pool, &policy, user_id).await.unwrap().unwrap();
        assert_eq!(stored.break_status, BreakStatus::Working);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].id, ended.id);
        assert!(!breaks[0].is_active());
        assert_eq!(breaks[0].notes.as_deref(), Some("Lunch"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn clock_out_persists_the_closed_break(pool: MySqlPool) {
        let policy = WorkPolicy::default();
        let user_id = seed_user(&pool, "jane@company.com").await;
        clock_in(&pool, &policy, user_id, None, None).await.unwrap();
        start_break(&pool, &policy, user_id, None).await.unwrap();

        let out = (Utc::now() + Duration::minutes(30)).to_rfc3339();
        let record = clock_out(&pool, &policy, user_id, &out, None, None).await.unwrap();
        assert!(record.is_clocked_out());
        assert_eq!(record.break_status, BreakStatus::Working);

        let (stored, breaks) = today(&pool, &policy, user_id).await.unwrap().unwrap();
        assert_eq!(stored.clock_out, record.clock_out);
        assert_eq!(stored.break_status, BreakStatus::Working);
        assert_eq!(breaks.len(), 1);
        assert!(!breaks[0].is_active());
        assert!(breaks[0].duration_minutes >= 29);

        let summary = get_monthly_summary(&pool, user_id, stored.date.year(), stored.date.month())
            .await
            .unwrap();
        assert_eq!(summary.totals.total_work_days, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn cancel_reopens_the_stored_day(pool: MySqlPool) {
        let policy = WorkPolicy::default();
        let user_id = seed_user(&pool, "jane@company.com").await;
        clock_in(&pool, &policy, user_id, None, None).await.unwrap();

        let out = (Utc::now() + Duration::minutes(5)).to_rfc3339();
        clock_out(&pool, &policy, user_id, &out, None, None).await.unwrap();
        cancel_clock_out(&pool, &policy, user_id).await.unwrap();

        let stored = current_record(&pool, &policy, user_id).await.unwrap().unwrap();
        assert!(stored.is_working());
        assert_eq!(stored.total_hours, 0.0);
        assert!(matches!(
            cancel_clock_out(&pool, &policy, user_id).await,
            Err(AttendanceError::NotClockedOut)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn instants_past_2038_round_trip(pool: MySqlPool) {
        let user_id = seed_user(&pool, "jane@company.com").await;
        let date = NaiveDate::from_ymd_opt(2040, 3, 1).unwrap();
        let clock_in_at = date.and_hms_opt(9, 0, 0).unwrap().and_utc();

        let mut conn = pool.acquire().await.unwrap();
        let mut record = repository::create_record(&mut conn, user_id, date, 60, clock_in_at)
            .await
            .unwrap();
        record.clock_in = Some(clock_in_at);
        record.clock_out = Some(clock_in_at + Duration::hours(9));
        repository::save_record(&mut conn, &record).await.unwrap();

        let stored = repository::find_record(&pool, user_id, date).await.unwrap().unwrap();
        assert_eq!(stored.clock_in, record.clock_in);
        assert_eq!(stored.clock_out, record.clock_out);
    }
}
