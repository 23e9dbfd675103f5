use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Already clocked in today")]
    AlreadyClockedIn,
    #[error("Already clocked out today")]
    AlreadyClockedOut,
    #[error("No attendance record found for today")]
    NoRecordFound,
    #[error("Not clocked in yet")]
    NotClockedIn,
    #[error("Not clocked out yet")]
    NotClockedOut,
    #[error("Already on break")]
    AlreadyOnBreak,
    #[error("Not on break")]
    NotOnBreak,
    /// `break_status` says on break but no open break row exists.
    #[error("No active break found")]
    NoActiveBreak,
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
    #[error("start_date cannot be after end_date")]
    InvalidDateRange,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl AttendanceError {
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AttendanceError::Database(_)
                | AttendanceError::CorruptRow(_)
                | AttendanceError::NoActiveBreak
        )
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        if self.is_infrastructure() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_infrastructure() {
            tracing::error!(error = %self, "Attendance operation failed");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn precondition_failures_are_client_errors_with_message() {
        let resp = AttendanceError::AlreadyOnBreak.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Already on break");
    }

    #[actix_web::test]
    async fn storage_failures_hide_details() {
        let err = AttendanceError::Database(sqlx::Error::RowNotFound);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Internal Server Error");
    }

    #[test]
    fn broken_break_cache_counts_as_internal() {
        assert!(AttendanceError::NoActiveBreak.is_infrastructure());
        assert!(!AttendanceError::NotOnBreak.is_infrastructure());
    }
}
