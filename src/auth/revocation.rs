use moka::future::Cache;
use std::time::Duration;

/// Tokens revoked before their expiry, keyed by `jti`.
///
/// Entries only need to outlive the token itself, so they expire after the
/// access-token TTL.
#[derive(Clone)]
pub struct RevocationList {
    revoked: Cache<String, ()>,
}

impl RevocationList {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            revoked: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(token_ttl)
                .build(),
        }
    }

    pub fn contains(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    pub async fn add(&self, jti: &str) {
        self.revoked.insert(jti.to_string(), ()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn added_token_is_revoked() {
        let list = RevocationList::new(Duration::from_secs(60));
        assert!(!list.contains("abc"));

        list.add("abc").await;
        assert!(list.contains("abc"));
        assert!(!list.contains("def"));
    }

    #[actix_web::test]
    async fn clones_share_state() {
        let list = RevocationList::new(Duration::from_secs(60));
        let other = list.clone();
        other.add("abc").await;
        assert!(list.contains("abc"));
    }
}
