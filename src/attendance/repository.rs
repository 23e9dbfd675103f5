use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, MySql, MySqlConnection, prelude::FromRow};

use crate::attendance::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, BreakStatus};
use crate::model::break_record::{BreakRecord, NewBreak};

const RECORD_COLUMNS: &str = r#"
    id, user_id, date, clock_in, clock_out, break_minutes, total_hours,
    overtime_hours, status, break_status, notes, created_at, updated_at
"#;

const BREAK_COLUMNS: &str = r#"
    id, attendance_id, break_start, break_end, duration_minutes, notes, created_at
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    clock_in: Option<DateTime<Utc>>,
    clock_out: Option<DateTime<Utc>>,
    break_minutes: u32,
    total_hours: f64,
    overtime_hours: f64,
    status: String,
    break_status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AttendanceError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            AttendanceError::CorruptRow(format!("attendance {} has status {:?}", row.id, row.status))
        })?;
        let break_status = BreakStatus::from_str(&row.break_status).map_err(|_| {
            AttendanceError::CorruptRow(format!(
                "attendance {} has break_status {:?}",
                row.id, row.break_status
            ))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            break_minutes: row.break_minutes,
            total_hours: row.total_hours,
            overtime_hours: row.overtime_hours,
            status,
            break_status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BreakRow {
    id: u64,
    attendance_id: u64,
    break_start: DateTime<Utc>,
    break_end: Option<DateTime<Utc>>,
    duration_minutes: u32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BreakRow> for BreakRecord {
    fn from(row: BreakRow) -> Self {
        BreakRecord {
            id: row.id,
            attendance_id: row.attendance_id,
            break_start: row.break_start,
            break_end: row.break_end,
            duration_minutes: row.duration_minutes,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// MySQL reports duplicate keys under SQLSTATE class 23000.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
        _ => false,
    }
}

pub async fn find_record<'e, E>(
    executor: E,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, AttendanceError>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE user_id = ? AND date = ?");

    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_optional(executor)
        .await?
        .map(AttendanceRecord::try_from)
        .transpose()
}

/// Same as [`find_record`] but takes the row lock for the rest of the
/// transaction, so transitions on one day never interleave.
pub async fn find_record_for_update(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, AttendanceError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE user_id = ? AND date = ? FOR UPDATE"
    );

    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_optional(conn)
        .await?
        .map(AttendanceRecord::try_from)
        .transpose()
}

/// Inserts an empty day. Returns the raw sqlx error so callers can tell a
/// duplicate `(user_id, date)` apart from other failures.
pub async fn create_record(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
    break_minutes: u32,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records
            (user_id, date, break_minutes, total_hours, overtime_hours,
             status, break_status, created_at, updated_at)
        VALUES (?, ?, ?, 0, 0, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(break_minutes)
    .bind(AttendanceStatus::Present.as_ref())
    .bind(BreakStatus::Working.as_ref())
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(AttendanceRecord::new(result.last_insert_id(), user_id, date, break_minutes, now))
}

pub async fn save_record(conn: &mut MySqlConnection, record: &AttendanceRecord) -> Result<(), AttendanceError> {
    sqlx::query(
        r#"
        UPDATE attendance_records
        SET clock_in = ?, clock_out = ?, break_minutes = ?, total_hours = ?,
            overtime_hours = ?, status = ?, break_status = ?, notes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(record.clock_in)
    .bind(record.clock_out)
    .bind(record.break_minutes)
    .bind(record.total_hours)
    .bind(record.overtime_hours)
    .bind(record.status.as_ref())
    .bind(record.break_status.as_ref())
    .bind(record.notes.as_deref())
    .bind(record.updated_at)
    .bind(record.id)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_break(conn: &mut MySqlConnection, new: &NewBreak) -> Result<BreakRecord, AttendanceError> {
    let result = sqlx::query(
        r#"
        INSERT INTO break_records (attendance_id, break_start, duration_minutes, notes, created_at)
        VALUES (?, ?, 0, ?, ?)
        "#,
    )
    .bind(new.attendance_id)
    .bind(new.break_start)
    .bind(new.notes.as_deref())
    .bind(new.break_start)
    .execute(conn)
    .await?;

    Ok(BreakRecord {
        id: result.last_insert_id(),
        attendance_id: new.attendance_id,
        break_start: new.break_start,
        break_end: None,
        duration_minutes: 0,
        notes: new.notes.clone(),
        created_at: new.break_start,
    })
}

pub async fn find_open_break(
    conn: &mut MySqlConnection,
    attendance_id: u64,
) -> Result<Option<BreakRecord>, AttendanceError> {
    let sql = format!(
        r#"
        SELECT {BREAK_COLUMNS} FROM break_records
        WHERE attendance_id = ? AND break_end IS NULL
        ORDER BY break_start DESC
        LIMIT 1
        FOR UPDATE
        "#
    );

    let row = sqlx::query_as::<_, BreakRow>(&sql)
        .bind(attendance_id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(BreakRecord::from))
}

pub async fn save_break(conn: &mut MySqlConnection, brk: &BreakRecord) -> Result<(), AttendanceError> {
    sqlx::query(
        r#"
        UPDATE break_records
        SET break_end = ?, duration_minutes = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(brk.break_end)
    .bind(brk.duration_minutes)
    .bind(brk.notes.as_deref())
    .bind(brk.id)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn list_breaks<'e, E>(executor: E, attendance_id: u64) -> Result<Vec<BreakRecord>, AttendanceError>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {BREAK_COLUMNS} FROM break_records WHERE attendance_id = ? ORDER BY break_start");

    let rows = sqlx::query_as::<_, BreakRow>(&sql)
        .bind(attendance_id)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(BreakRecord::from).collect())
}

/// Records with `start <= date <= end`, newest first.
pub async fn find_records<'e, E>(
    executor: E,
    user_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceRecord>, AttendanceError>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        r#"
        SELECT {RECORD_COLUMNS} FROM attendance_records
        WHERE user_id = ? AND date >= ? AND date <= ?
        ORDER BY date DESC
        "#
    );

    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(status: &str, break_status: &str) -> AttendanceRow {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        AttendanceRow {
            id: 3,
            user_id: 9,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            clock_in: Some(now),
            clock_out: None,
            break_minutes: 60,
            total_hours: 0.0,
            overtime_hours: 0.0,
            status: status.to_string(),
            break_status: break_status.to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn maps_stored_enums() {
        let record = AttendanceRecord::try_from(row("half_day", "on_break")).unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
        assert_eq!(record.break_status, BreakStatus::OnBreak);
        assert!(record.is_on_break());
    }

    #[test]
    fn unknown_status_is_corrupt() {
        let err = AttendanceRecord::try_from(row("vacation", "working")).unwrap_err();
        assert!(matches!(err, AttendanceError::CorruptRow(_)));
    }

    #[derive(Debug)]
    struct MySqlFailure {
        code: &'static str,
    }

    impl std::fmt::Display for MySqlFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "mysql error {}", self.code)
        }
    }

    impl std::error::Error for MySqlFailure {}

    impl sqlx::error::DatabaseError for MySqlFailure {
        fn message(&self) -> &str {
            "Duplicate entry '9-2026-01-05' for key 'uq_attendance_user_date'"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_key_is_a_unique_violation() {
        let err = sqlx::Error::Database(Box::new(MySqlFailure { code: "23000" }));
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn other_errors_are_not_duplicates() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));

        let err = sqlx::Error::Database(Box::new(MySqlFailure { code: "40001" }));
        assert!(!is_unique_violation(&err));
    }
}
