use crate::{
    auth::{
        allow_list::AllowList,
        auth::AuthUser,
        jwt::generate_access_token,
        password::{check_strength, hash_password, verify_password},
        revocation::RevocationList,
        users::{self, NewUser},
    },
    attendance::repository::is_unique_violation,
    config::Config,
    model::{role::Role, user::UserResponse},
    models::{LoginReqDto, LoginResponse, RegisterReq},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AllowedUserReq {
    #[schema(example = "jane@company.com", format = "email")]
    pub email: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RestrictionQuery {
    /// Turn the allow-list check on or off
    pub enable: bool,
}

/// Self-registration always yields an employee; admins come from the
/// bootstrap account.
fn registration_row<'a>(req: &'a RegisterReq, email: &'a str, password_hash: &'a str) -> NewUser<'a> {
    NewUser {
        email,
        password_hash,
        first_name: req.first_name.trim(),
        last_name: req.last_name.trim(),
        role: Role::Employee,
        department: req.department.as_deref(),
        employee_code: req.employee_code.as_deref(),
    }
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation failed or email already used", body = Object, example = json!({
            "error": "Email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(user, pool, config), fields(email = %user.email))]
pub async fn register(
    user: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let email = user.email.trim().to_lowercase();

    if email.is_empty() || !email.contains('@') {
        return HttpResponse::BadRequest().json(json!({"error": "A valid email is required"}));
    }
    if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "First and last name are required"}));
    }
    if let Err(msg) = check_strength(&user.password, config.min_password_length) {
        return HttpResponse::BadRequest().json(json!({"error": msg}));
    }

    match users::find_by_email(pool.get_ref(), &email).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(json!({"error": "Email already registered"}));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Database error while checking email");
            return HttpResponse::InternalServerError().finish();
        }
    }

    let hashed = match hash_password(&user.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let new_user = registration_row(&user, &email, &hashed);

    let id = match users::insert(pool.get_ref(), &new_user).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return HttpResponse::BadRequest()
                .json(json!({"error": "Email or employee code already registered"}));
        }
        Err(e) => {
            error!(error = %e, "Failed to register user");
            return HttpResponse::InternalServerError().json(json!({"error": "Failed to register user"}));
        }
    };

    match users::find_by_id(pool.get_ref(), id).await {
        Ok(Some(created)) => {
            info!(user_id = id, "User registered");
            HttpResponse::Created().json(UserResponse::from(&created))
        }
        Ok(None) | Err(_) => HttpResponse::Created().json(json!({"id": id, "email": email})),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Inactive user"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Login not permitted for this account")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, allow_list, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    allow_list: web::Data<AllowList>,
) -> impl Responder {
    info!("Login request received");

    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({"error": "Email and password required"}));
    }

    if !allow_list.is_permitted(&email) {
        warn!("Login refused by allow-list");
        return HttpResponse::Forbidden()
            .json(json!({"error": "Login is not permitted for this account"}));
    }

    debug!("Fetching user from database");

    let db_user = match users::find_by_email(pool.get_ref(), &email).await {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid email or password"}));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({"error": "Invalid email or password"}));
    }

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: inactive user");
        return HttpResponse::BadRequest().json(json!({"error": "Inactive user"}));
    }

    let access_token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok((token, _)) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = users::touch_last_login(pool.get_ref(), db_user.id).await {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = Object, example = json!({"message": "Logged out"})),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(auth: AuthUser, revoked: web::Data<RevocationList>) -> impl Responder {
    revoked.add(&auth.token_id).await;
    info!(user_id = auth.user_id, "Logged out");

    HttpResponse::Ok().json(json!({"message": "Logged out"}))
}

#[utoipa::path(
    get,
    path = "/auth/logout/status",
    responses(
        (status = 200, description = "Revocation state of the presented token", body = Object, example = json!({
            "email": "jane@company.com",
            "token_revoked": false
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout_status(auth: AuthUser, revoked: web::Data<RevocationList>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "email": auth.email,
        "token_revoked": revoked.contains(&auth.token_id),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/allowed-users",
    responses(
        (status = 200, description = "Allow-list state", body = Object, example = json!({
            "enabled": true,
            "emails": ["jane@company.com"]
        })),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn list_allowed_users(
    auth: AuthUser,
    allow_list: web::Data<AllowList>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(json!({
        "enabled": allow_list.is_enabled(),
        "emails": allow_list.emails(),
    })))
}

#[utoipa::path(
    post,
    path = "/auth/allowed-users",
    request_body = AllowedUserReq,
    responses(
        (status = 200, description = "Email added"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn add_allowed_user(
    auth: AuthUser,
    allow_list: web::Data<AllowList>,
    payload: web::Json<AllowedUserReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let email = payload.email.trim();
    if email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"message": "Email is required"})));
    }

    let added = allow_list.add(email).await.map_err(|e| {
        error!(error = %e, "Failed to persist allow-list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(admin_id = auth.user_id, email, added, "Allow-list entry added");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{email} is on the allow-list")
    })))
}

#[utoipa::path(
    delete,
    path = "/auth/allowed-users/{email}",
    params(("email" = String, Path, description = "Email to remove")),
    responses(
        (status = 200, description = "Email removed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Email not on the allow-list")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn remove_allowed_user(
    auth: AuthUser,
    allow_list: web::Data<AllowList>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let email = path.into_inner();
    let removed = allow_list.remove(&email).await.map_err(|e| {
        error!(error = %e, "Failed to persist allow-list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !removed {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Email is not on the allow-list"
        })));
    }

    info!(admin_id = auth.user_id, email = %email, "Allow-list entry removed");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{email} removed from the allow-list")
    })))
}

#[utoipa::path(
    put,
    path = "/auth/login-restriction",
    params(RestrictionQuery),
    responses(
        (status = 200, description = "Restriction toggled"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn set_login_restriction(
    auth: AuthUser,
    allow_list: web::Data<AllowList>,
    query: web::Query<RestrictionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    allow_list.set_enabled(query.enable).await.map_err(|e| {
        error!(error = %e, "Failed to persist allow-list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(admin_id = auth.user_id, enabled = query.enable, "Login restriction changed");
    Ok(HttpResponse::Ok().json(json!({
        "enabled": query.enable
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_ignores_requested_role() {
        let req: RegisterReq = serde_json::from_value(json!({
            "email": "mallory@company.com",
            "password": "s3cretpass",
            "first_name": " Mallory ",
            "last_name": "Doe",
            "role": "admin",
            "employee_code": "EMP-9"
        }))
        .unwrap();

        let row = registration_row(&req, "mallory@company.com", "hash");
        assert_eq!(row.role, Role::Employee);
        assert_eq!(row.first_name, "Mallory");
        assert_eq!(row.employee_code, Some("EMP-9"));
        assert_eq!(row.department, None);
    }
}
