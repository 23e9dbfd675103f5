use crate::api::attendance::{
    AttendanceRecordResponse, BreakRecordResponse, BreakRequest, BreakTransitionResponse,
    ClockInRequest, ClockOutRequest, MonthlySummaryResponse, StatusResponse, TodayResponse,
};
use crate::api::users::UserListResponse;
use crate::attendance::summary::SummaryTotals;
use crate::auth::handlers::AllowedUserReq;
use crate::model::attendance::{AttendanceState, AttendanceStatus, BreakStatus};
use crate::model::role::Role;
use crate::model::user::UserResponse;
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timecard API",
        version = "1.0.0",
        description = r#"
## Employee Time Tracking

Records when employees start and finish work each day, the breaks they take,
and the hours that result.

### Key Features
- **Attendance**
  - Clock in, clock out (with an explicit instant), undo a clock-out
  - Start and end breaks; an open break is closed on clock-out
  - Late / early-leave / half-day status from the configured work hours
  - Total and overtime hours per day
- **Reporting**
  - Records by date range, month history, monthly totals
  - Admins can read any employee's records and summaries
- **Accounts**
  - Registration, login, logout with token revocation
  - Optional login allow-list, user activation

### Security
Endpoints other than login and registration need a **JWT Bearer** token.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::logout_status,
        crate::auth::handlers::list_allowed_users,
        crate::auth::handlers::add_allowed_user,
        crate::auth::handlers::remove_allowed_user,
        crate::auth::handlers::set_login_restriction,

        crate::api::users::me,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::activate_user,
        crate::api::users::deactivate_user,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::cancel_clock_out,
        crate::api::attendance::start_break,
        crate::api::attendance::end_break,
        crate::api::attendance::today,
        crate::api::attendance::status,
        crate::api::attendance::records,
        crate::api::attendance::history,
        crate::api::attendance::monthly_summary,
        crate::api::attendance::user_records,
        crate::api::attendance::user_monthly_summary
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            AllowedUserReq,
            Role,
            UserResponse,
            UserListResponse,
            ClockInRequest,
            ClockOutRequest,
            BreakRequest,
            AttendanceStatus,
            BreakStatus,
            AttendanceState,
            AttendanceRecordResponse,
            BreakRecordResponse,
            BreakTransitionResponse,
            TodayResponse,
            StatusResponse,
            SummaryTotals,
            MonthlySummaryResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and access control"),
        (name = "Users", description = "User accounts"),
        (name = "Attendance", description = "Clock-in/out, breaks and reporting"),
    )
)]
pub struct ApiDoc;
