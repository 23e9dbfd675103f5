use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::auth::revocation::RevocationList;
use crate::auth::users;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use sqlx::MySqlPool;

fn reject(req: ServiceRequest, resp: HttpResponse) -> Result<ServiceResponse<BoxBody>, Error> {
    Ok(req.into_response(resp.map_into_boxed_body()))
}

pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
    let pool = req
        .app_data::<Data<MySqlPool>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Database pool missing"))?;
    let revoked = req
        .app_data::<Data<RevocationList>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Revocation list missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => {
                let resp = HttpResponse::Unauthorized()
                    .json(json!({"error": "Invalid Authorization header encoding"}));
                return reject(req, resp);
            }
        },
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Missing Authorization header"}));
            return reject(req, resp);
        }
    };

    let token = match bearer_token(&header_value) {
        Some(t) => t,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Authorization header must start with Bearer"}));
            return reject(req, resp);
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Invalid or expired token", "details": e.to_string()}));
            return reject(req, resp);
        }
    };

    if revoked.contains(&claims.jti) {
        let resp = HttpResponse::Unauthorized().json(json!({"error": "Token has been revoked"}));
        return reject(req, resp);
    }

    let user = match users::find_by_id(pool.get_ref(), claims.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "User not found"}));
            return reject(req, resp);
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = claims.user_id, "Failed to load user for token");
            return reject(req, HttpResponse::InternalServerError().finish());
        }
    };

    if !user.is_active {
        let resp = HttpResponse::BadRequest().json(json!({"error": "Inactive user"}));
        return reject(req, resp);
    }

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
        token_id: claims.jti,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
