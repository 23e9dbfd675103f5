use crate::{
    attendance::{error::AttendanceError, service, summary::MonthlySummary, summary::SummaryTotals},
    auth::auth::AuthUser,
    config::Config,
    model::{
        attendance::{AttendanceRecord, AttendanceState, AttendanceStatus, BreakStatus},
        break_record::BreakRecord,
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ClockInRequest {
    #[schema(example = "Working from the office")]
    pub notes: Option<String>,
    /// Planned break allowance; defaults to the configured value.
    #[schema(example = 60)]
    pub break_minutes: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClockOutRequest {
    /// ISO-8601 instant; a value without offset is read as UTC.
    #[schema(example = "2026-01-15T18:30:00+09:00")]
    pub clock_out: String,
    #[schema(example = 45)]
    pub break_minutes: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BreakRequest {
    #[schema(example = "Lunch")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordsQuery {
    /// Inclusive, `YYYY-MM-DD`
    #[param(value_type = String, format = "date", example = "2026-01-01")]
    pub start_date: NaiveDate,
    /// Inclusive, `YYYY-MM-DD`
    #[param(value_type = String, format = "date", example = "2026-01-31")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    #[param(example = 2026)]
    pub year: i32,
    #[param(example = 1)]
    pub month: u32,
}

/// Both fields or neither; neither means the last 30 days.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceRecordResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-01-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2026-01-15T00:05:00Z", format = "date-time", value_type = String, nullable = true)]
    pub clock_in: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-15T09:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,
    #[schema(example = 60)]
    pub break_minutes: u32,
    #[schema(example = 8.42)]
    pub total_hours: f64,
    #[schema(example = 0.42)]
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
    pub break_status: BreakStatus,
    pub notes: Option<String>,
    pub state: AttendanceState,
    pub is_clocked_in: bool,
    pub is_clocked_out: bool,
    pub is_working: bool,
    pub is_on_break: bool,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<&AttendanceRecord> for AttendanceRecordResponse {
    fn from(r: &AttendanceRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            clock_in: r.clock_in,
            clock_out: r.clock_out,
            break_minutes: r.break_minutes,
            total_hours: r.total_hours,
            overtime_hours: r.overtime_hours,
            status: r.status,
            break_status: r.break_status,
            notes: r.notes.clone(),
            state: r.state(),
            is_clocked_in: r.is_clocked_in(),
            is_clocked_out: r.is_clocked_out(),
            is_working: r.is_working(),
            is_on_break: r.is_on_break(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BreakRecordResponse {
    pub id: u64,
    pub attendance_id: u64,
    #[schema(format = "date-time", value_type = String)]
    pub break_start: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub break_end: Option<DateTime<Utc>>,
    #[schema(example = 30)]
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl From<&BreakRecord> for BreakRecordResponse {
    fn from(b: &BreakRecord) -> Self {
        Self {
            id: b.id,
            attendance_id: b.attendance_id,
            break_start: b.break_start,
            break_end: b.break_end,
            duration_minutes: b.duration_minutes,
            notes: b.notes.clone(),
            is_active: b.is_active(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BreakTransitionResponse {
    pub attendance: AttendanceRecordResponse,
    #[serde(rename = "break")]
    pub break_record: BreakRecordResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodayResponse {
    pub attendance: AttendanceRecordResponse,
    pub breaks: Vec<BreakRecordResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub state: AttendanceState,
    pub is_clocked_in: bool,
    pub is_clocked_out: bool,
    pub is_on_break: bool,
    pub attendance: Option<AttendanceRecordResponse>,
}

impl StatusResponse {
    fn from_record(record: Option<&AttendanceRecord>) -> Self {
        match record {
            Some(r) => Self {
                state: r.state(),
                is_clocked_in: r.is_clocked_in(),
                is_clocked_out: r.is_clocked_out(),
                is_on_break: r.is_on_break(),
                attendance: Some(r.into()),
            },
            None => Self {
                state: AttendanceState::NotStarted,
                is_clocked_in: false,
                is_clocked_out: false,
                is_on_break: false,
                attendance: None,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlySummaryResponse {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
    #[serde(flatten)]
    pub totals: SummaryTotals,
    pub records: Vec<AttendanceRecordResponse>,
}

impl From<MonthlySummary> for MonthlySummaryResponse {
    fn from(summary: MonthlySummary) -> Self {
        Self {
            year: summary.year,
            month: summary.month,
            totals: summary.totals,
            records: summary.records.iter().map(Into::into).collect(),
        }
    }
}

/// Body of an endpoint whose payload is optional: an empty body means all
/// defaults, anything else must parse.
fn optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AttendanceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AttendanceError::InvalidBody(e.to_string()))
}

fn records_response(records: &[AttendanceRecord]) -> Vec<AttendanceRecordResponse> {
    records.iter().map(Into::into).collect()
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in", body = AttendanceRecordResponse),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "message": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> Result<HttpResponse, AttendanceError> {
    let body: ClockInRequest = optional_body(&body)?;

    let record = service::clock_in(
        pool.get_ref(),
        &config.work_policy,
        auth.user_id,
        body.notes,
        body.break_minutes,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AttendanceRecordResponse::from(&record)))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    request_body = ClockOutRequest,
    responses(
        (status = 200, description = "Clocked out", body = AttendanceRecordResponse),
        (status = 400, description = "Not clocked in, already clocked out or bad timestamp", body = Object, example = json!({
            "message": "Already clocked out today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<ClockOutRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let body = body.into_inner();

    let record = service::clock_out(
        pool.get_ref(),
        &config.work_policy,
        auth.user_id,
        &body.clock_out,
        body.break_minutes,
        body.notes,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AttendanceRecordResponse::from(&record)))
}

#[utoipa::path(
    post,
    path = "/api/attendance/cancel-clock-out",
    responses(
        (status = 200, description = "Clock-out undone", body = AttendanceRecordResponse),
        (status = 400, description = "Not clocked out yet", body = Object, example = json!({
            "message": "Not clocked out yet"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn cancel_clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AttendanceError> {
    let record = service::cancel_clock_out(pool.get_ref(), &config.work_policy, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AttendanceRecordResponse::from(&record)))
}

#[utoipa::path(
    post,
    path = "/api/attendance/break/start",
    request_body = BreakRequest,
    responses(
        (status = 200, description = "Break started", body = BreakTransitionResponse),
        (status = 400, description = "Not working or already on break", body = Object, example = json!({
            "message": "Already on break"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn start_break(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> Result<HttpResponse, AttendanceError> {
    let body: BreakRequest = optional_body(&body)?;

    let (record, brk) =
        service::start_break(pool.get_ref(), &config.work_policy, auth.user_id, body.notes).await?;

    Ok(HttpResponse::Ok().json(BreakTransitionResponse {
        attendance: (&record).into(),
        break_record: (&brk).into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/attendance/break/end",
    request_body = BreakRequest,
    responses(
        (status = 200, description = "Break ended", body = BreakTransitionResponse),
        (status = 400, description = "Not on break", body = Object, example = json!({
            "message": "Not on break"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn end_break(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> Result<HttpResponse, AttendanceError> {
    let body: BreakRequest = optional_body(&body)?;

    let (record, brk) =
        service::end_break(pool.get_ref(), &config.work_policy, auth.user_id, body.notes).await?;

    Ok(HttpResponse::Ok().json(BreakTransitionResponse {
        attendance: (&record).into(),
        break_record: (&brk).into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record and breaks", body = TodayResponse),
        (status = 404, description = "No record yet today", body = Object, example = json!({
            "message": "No attendance record found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AttendanceError> {
    match service::today(pool.get_ref(), &config.work_policy, auth.user_id).await? {
        Some((record, breaks)) => Ok(HttpResponse::Ok().json(TodayResponse {
            attendance: (&record).into(),
            breaks: breaks.iter().map(Into::into).collect(),
        })),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": AttendanceError::NoRecordFound.to_string()
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Current lifecycle position", body = StatusResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AttendanceError> {
    let record = service::current_record(pool.get_ref(), &config.work_policy, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(StatusResponse::from_record(record.as_ref())))
}

#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Records in range, newest first", body = [AttendanceRecordResponse]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RecordsQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let records =
        service::get_user_records(pool.get_ref(), auth.user_id, query.start_date, query.end_date).await?;

    Ok(HttpResponse::Ok().json(records_response(&records)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "A month of records, or the last 30 days", body = [AttendanceRecordResponse]),
        (status = 400, description = "Invalid month or only one of year/month given"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let records = match (query.year, query.month) {
        (Some(year), Some(month)) => {
            service::get_monthly_summary(pool.get_ref(), auth.user_id, year, month)
                .await?
                .records
        }
        (None, None) => {
            service::get_recent_records(pool.get_ref(), &config.work_policy, auth.user_id).await?
        }
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "year and month must be given together"
            })));
        }
    };

    Ok(HttpResponse::Ok().json(records_response(&records)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly totals and records", body = MonthlySummaryResponse),
        (status = 400, description = "Invalid month", body = Object, example = json!({
            "message": "Invalid month: 13"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let summary =
        service::get_monthly_summary(pool.get_ref(), auth.user_id, query.year, query.month).await?;

    Ok(HttpResponse::Ok().json(MonthlySummaryResponse::from(summary)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/users/{id}/records",
    params(("id" = u64, Path, description = "User id"), RecordsQuery),
    responses(
        (status = 200, description = "Records in range, newest first", body = [AttendanceRecordResponse]),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn user_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<RecordsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let records =
        service::get_user_records(pool.get_ref(), path.into_inner(), query.start_date, query.end_date)
            .await?;

    Ok(HttpResponse::Ok().json(records_response(&records)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/users/{id}/summary/monthly",
    params(("id" = u64, Path, description = "User id"), MonthQuery),
    responses(
        (status = 200, description = "Monthly totals and records", body = MonthlySummaryResponse),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn user_monthly_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let summary =
        service::get_monthly_summary(pool.get_ref(), path.into_inner(), query.year, query.month).await?;

    Ok(HttpResponse::Ok().json(MonthlySummaryResponse::from(summary)))
}
