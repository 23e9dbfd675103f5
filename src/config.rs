use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::attendance::policy::{WorkPolicy, parse_time_of_day, parse_timezone};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub allow_list_path: String,
    pub min_password_length: usize,

    pub work_policy: WorkPolicy,

    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let work_policy = WorkPolicy {
            work_start: parse_time_of_day(&or_default("WORK_START", "09:00")).context("WORK_START")?,
            work_end: parse_time_of_day(&or_default("WORK_END", "18:00")).context("WORK_END")?,
            regular_hours: number(&lookup, "REGULAR_WORK_HOURS", 8.0)?,
            default_break_minutes: number(&lookup, "DEFAULT_BREAK_MINUTES", 60)?,
            timezone: parse_timezone(&or_default("WORK_TIMEZONE", "UTC")).context("WORK_TIMEZONE")?,
        };

        let bootstrap_admin = match (lookup("BOOTSTRAP_ADMIN_EMAIL"), lookup("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.trim().is_empty() => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: number(&lookup, "ACCESS_TOKEN_TTL", 1800)?, // default 30 min

            rate_login_per_min: number(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: number(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: number(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: or_default("API_PREFIX", "/api"),
            allow_list_path: or_default("ALLOW_LIST_PATH", "allowed_users.json"),
            min_password_length: number(&lookup, "MIN_PASSWORD_LENGTH", 8)?,

            work_policy,
            bootstrap_admin,
        })
    }
}

fn number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SERVER_ADDR", "127.0.0.1:8080".to_string()),
            ("DATABASE_URL", "mysql://localhost/timecard".to_string()),
            ("JWT_SECRET", "secret".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config> {
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.access_token_ttl, 1800);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.work_policy.work_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.work_policy.work_end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(config.work_policy.default_break_minutes, 60);
        assert_eq!(config.work_policy.regular_hours, 8.0);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn overrides_work_rules() {
        let mut vars = base();
        vars.insert("WORK_START", "08:30".to_string());
        vars.insert("WORK_TIMEZONE", "Asia/Tokyo".to_string());
        vars.insert("REGULAR_WORK_HOURS", "7.5".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.work_policy.work_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.work_policy.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.work_policy.regular_hours, 7.5);
    }

    #[test]
    fn missing_required_key_is_named() {
        let mut vars = base();
        vars.remove("JWT_SECRET");
        let err = load(&vars).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn bad_number_is_named() {
        let mut vars = base();
        vars.insert("DEFAULT_BREAK_MINUTES", "-5".to_string());
        let err = load(&vars).err().unwrap();
        assert!(err.to_string().contains("DEFAULT_BREAK_MINUTES"));
    }
}
