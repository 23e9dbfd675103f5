//! Attendance lifecycle transitions.
//!
//! Every operation validates its preconditions against the loaded record,
//! mutates it in place and returns whatever break row has to be written
//! alongside it. Nothing here touches storage or reads the clock; the
//! service layer supplies `now` and persists the result in one transaction.

use chrono::{DateTime, Utc};

use crate::attendance::error::AttendanceError;
use crate::attendance::policy::WorkPolicy;
use crate::attendance::time::{hours_between, round2, rounded_minutes_between};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, BreakStatus};
use crate::model::break_record::{BreakRecord, NewBreak};

fn non_empty(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

impl AttendanceRecord {
    pub fn clock_in(
        &mut self,
        policy: &WorkPolicy,
        now: DateTime<Utc>,
        notes: Option<String>,
        break_minutes: u32,
    ) -> Result<(), AttendanceError> {
        if self.is_clocked_in() {
            return Err(AttendanceError::AlreadyClockedIn);
        }

        self.break_minutes = break_minutes;
        self.clock_in = Some(now);
        self.notes = notes;
        self.status = AttendanceStatus::on_clock_in(policy.is_late(now));
        self.updated_at = now;
        Ok(())
    }

    /// Closes the day at `at`. An open break is closed at the same instant
    /// and handed back so it can be saved with the record.
    pub fn clock_out(
        &mut self,
        policy: &WorkPolicy,
        at: DateTime<Utc>,
        break_minutes: Option<u32>,
        notes: Option<String>,
        open_break: Option<BreakRecord>,
        now: DateTime<Utc>,
    ) -> Result<Option<BreakRecord>, AttendanceError> {
        let clock_in = self.clock_in.ok_or(AttendanceError::NotClockedIn)?;
        if self.is_clocked_out() {
            return Err(AttendanceError::AlreadyClockedOut);
        }
        if at < clock_in {
            return Err(AttendanceError::InvalidTimestamp(format!(
                "clock-out {} precedes clock-in {}",
                at.to_rfc3339(),
                clock_in.to_rfc3339()
            )));
        }

        let closed_break = if self.is_on_break() {
            let mut open = open_break.ok_or(AttendanceError::NoActiveBreak)?;
            open.close(at.max(open.break_start), None);
            self.break_status = BreakStatus::Working;
            Some(open)
        } else {
            None
        };

        self.clock_out = Some(at);
        if let Some(minutes) = break_minutes {
            self.break_minutes = minutes;
        }
        if let Some(notes) = non_empty(notes) {
            self.notes = Some(notes);
        }

        let raw_hours = hours_between(clock_in, at);
        let break_hours = f64::from(self.break_minutes) / 60.0;
        let worked = if raw_hours > break_hours {
            raw_hours - break_hours
        } else {
            raw_hours
        };
        self.total_hours = round2(worked);

        if self.total_hours > policy.regular_hours {
            self.overtime_hours = round2(self.total_hours - policy.regular_hours);
        }

        if policy.leaves_early(at) {
            self.status = self.status.on_early_leave();
        }

        self.updated_at = now;
        Ok(closed_break)
    }

    /// Reopens a closed day. Break rows and `break_minutes` are kept.
    pub fn cancel_clock_out(&mut self, policy: &WorkPolicy, now: DateTime<Utc>) -> Result<(), AttendanceError> {
        let clock_in = self.clock_in.ok_or(AttendanceError::NotClockedIn)?;
        if !self.is_clocked_out() {
            return Err(AttendanceError::NotClockedOut);
        }

        self.clock_out = None;
        self.total_hours = 0.0;
        self.overtime_hours = 0.0;
        self.status = AttendanceStatus::on_clock_in(policy.is_late(clock_in));
        self.updated_at = now;
        Ok(())
    }

    fn ensure_open_day(&self) -> Result<(), AttendanceError> {
        if !self.is_clocked_in() {
            return Err(AttendanceError::NotClockedIn);
        }
        if self.is_clocked_out() {
            return Err(AttendanceError::AlreadyClockedOut);
        }
        Ok(())
    }

    pub fn start_break(&mut self, now: DateTime<Utc>, notes: Option<String>) -> Result<NewBreak, AttendanceError> {
        self.ensure_open_day()?;
        if self.is_on_break() {
            return Err(AttendanceError::AlreadyOnBreak);
        }

        self.break_status = BreakStatus::OnBreak;
        self.updated_at = now;
        Ok(NewBreak {
            attendance_id: self.id,
            break_start: now,
            notes: non_empty(notes),
        })
    }

    /// `open_break` is the row with a null end, if storage found one.
    pub fn end_break(
        &mut self,
        open_break: Option<BreakRecord>,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<BreakRecord, AttendanceError> {
        self.ensure_open_day()?;
        if !self.is_on_break() {
            return Err(AttendanceError::NotOnBreak);
        }

        let mut open = open_break
            .filter(|b| b.attendance_id == self.id && b.is_active())
            .ok_or(AttendanceError::NoActiveBreak)?;
        open.close(now, notes);

        self.break_status = BreakStatus::Working;
        self.updated_at = now;
        Ok(open)
    }
}

impl BreakRecord {
    fn close(&mut self, end: DateTime<Utc>, notes: Option<String>) {
        self.break_end = Some(end);
        self.duration_minutes = rounded_minutes_between(self.break_start, end);
        if let Some(notes) = non_empty(notes) {
            self.notes = Some(notes);
        }
    }
}
