use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakRecord {
    pub id: u64,
    pub attendance_id: u64,
    pub break_start: DateTime<Utc>,
    pub break_end: Option<DateTime<Utc>>,
    /// Zero while the break is open.
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BreakRecord {
    pub fn is_active(&self) -> bool {
        self.break_end.is_none()
    }
}

/// A break that has been decided on but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBreak {
    pub attendance_id: u64,
    pub break_start: DateTime<Utc>,
    pub notes: Option<String>,
}
