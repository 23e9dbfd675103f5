use std::time::{SystemTime, UNIX_EPOCH};

use crate::{model::role::Role, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let (token, issued) = generate_access_token(5, "jane@company.com".into(), Role::Admin, "k1", 600).unwrap();
        let claims = verify_token(&token, "k1").unwrap();

        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.sub, "jane@company.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = generate_access_token(5, "jane@company.com".into(), Role::Employee, "k1", 600).unwrap();
        assert!(verify_token(&token, "k2").is_err());
    }

    #[test]
    fn tokens_get_distinct_ids() {
        let (_, a) = generate_access_token(1, "a@b.c".into(), Role::Employee, "k", 60).unwrap();
        let (_, b) = generate_access_token(1, "a@b.c".into(), Role::Employee, "k", 60).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
