use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The authenticated principal. Placed in request extensions by
/// `auth_middleware` once the token, revocation list and user row check out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    /// `jti` of the bearer token, used for logout.
    pub token_id: String,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Not authenticated"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "jane@company.com".into(),
            role,
            token_id: "t".into(),
        }
    }

    #[actix_web::test]
    async fn extracts_principal_from_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(user(Role::Employee));

        let extracted = AuthUser::extract(&req).await.unwrap();
        assert_eq!(extracted.user_id, 1);
        assert!(!extracted.is_admin());
    }

    #[actix_web::test]
    async fn missing_principal_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn admin_gate() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Employee).require_admin().is_err());
    }
}
