use crate::{auth::auth::AuthUser, auth::users, model::user::UserResponse};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

const MAX_LIMIT: u64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Rows to skip, default 0
    pub skip: Option<u64>,
    /// Page size, default 20, capped at 100
    pub limit: Option<u64>,
}

impl UserListQuery {
    fn window(&self) -> (u64, u64) {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(20).clamp(1, MAX_LIMIT);
        (skip, limit)
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[schema(example = 0)]
    pub skip: u64,
    #[schema(example = 20)]
    pub limit: u64,
    #[schema(example = 42)]
    pub total: i64,
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Database error");
    ErrorInternalServerError("Internal Server Error")
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The calling user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let user = users::find_by_id(pool.get_ref(), auth.user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("User not found"))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users ordered by id", body = UserListResponse),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserListQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (skip, limit) = query.window();
    let data = users::list(pool.get_ref(), skip, limit).await.map_err(db_error)?;
    let total = users::count(pool.get_ref()).await.map_err(db_error)?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: data.iter().map(UserResponse::from).collect(),
        skip,
        limit,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Admin only, unless reading yourself"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    if id != auth.user_id {
        auth.require_admin()?;
    }

    match users::find_by_id(pool.get_ref(), id).await.map_err(db_error)? {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(&user))),
        None => Ok(HttpResponse::NotFound().json(json!({"message": "User not found"}))),
    }
}

async fn set_active(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    id: u64,
    active: bool,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    if !active && id == auth.user_id {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot deactivate your own account"
        })));
    }

    if !users::set_active(pool.get_ref(), id, active).await.map_err(db_error)? {
        return Ok(HttpResponse::NotFound().json(json!({"message": "User not found"})));
    }

    info!(admin_id = auth.user_id, user_id = id, active, "User activation changed");

    match users::find_by_id(pool.get_ref(), id).await.map_err(db_error)? {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(&user))),
        None => Ok(HttpResponse::NotFound().json(json!({"message": "User not found"}))),
    }
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/activate",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn activate_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_active(auth, pool, path.into_inner(), true).await
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/deactivate",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn deactivate_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_active(auth, pool, path.into_inner(), false).await
}
