use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Outcome of the day. Only the state machine moves a record between
/// these; callers never set it directly.
///
/// | from           | event                          | to            |
/// |----------------|--------------------------------|---------------|
/// | (new)          | clock-in at/before work start  | `present`     |
/// | (new)          | clock-in after work start      | `late`        |
/// | `late`         | clock-out before work end      | `half_day`    |
/// | other          | clock-out before work end      | `early_leave` |
/// | any            | clock-out at/after work end    | unchanged     |
/// | any            | cancel clock-out               | from clock-in |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    EarlyLeave,
    HalfDay,
}

impl AttendanceStatus {
    pub fn on_clock_in(late: bool) -> Self {
        if late {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn on_early_leave(self) -> Self {
        match self {
            AttendanceStatus::Late => AttendanceStatus::HalfDay,
            _ => AttendanceStatus::EarlyLeave,
        }
    }
}

/// Cached mirror of "an open break row exists for this record".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BreakStatus {
    Working,
    OnBreak,
}

/// Lifecycle position of a day, derived from the stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NotStarted,
    Working,
    OnBreak,
    ClockedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub break_minutes: u32,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
    pub break_status: BreakStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// A freshly created day, before anyone clocked in.
    pub fn new(id: u64, user_id: u64, date: NaiveDate, break_minutes: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            date,
            clock_in: None,
            clock_out: None,
            break_minutes,
            total_hours: 0.0,
            overtime_hours: 0.0,
            status: AttendanceStatus::Present,
            break_status: BreakStatus::Working,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_clocked_in(&self) -> bool {
        self.clock_in.is_some()
    }

    pub fn is_clocked_out(&self) -> bool {
        self.clock_out.is_some()
    }

    pub fn is_working(&self) -> bool {
        self.is_clocked_in() && !self.is_clocked_out()
    }

    pub fn is_on_break(&self) -> bool {
        self.break_status == BreakStatus::OnBreak
    }

    pub fn state(&self) -> AttendanceState {
        if !self.is_clocked_in() {
            AttendanceState::NotStarted
        } else if self.is_clocked_out() {
            AttendanceState::ClockedOut
        } else if self.is_on_break() {
            AttendanceState::OnBreak
        } else {
            AttendanceState::Working
        }
    }
}
