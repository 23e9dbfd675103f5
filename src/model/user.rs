use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub employee_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "Doe Jane")]
    pub full_name: String,
    pub role: Role,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "EMP-001", nullable = true)]
    pub employee_code: Option<String>,
    pub is_active: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-02T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[schema(example = "2026-01-15T00:05:00Z", format = "date-time", value_type = String, nullable = true)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role,
            department: user.department.clone(),
            employee_code: user.employee_code.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn response_carries_name_and_activity_times() {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let login = Utc.with_ymd_and_hms(2026, 1, 15, 0, 5, 0).unwrap();
        let user = User {
            id: 4,
            email: "jane@company.com".into(),
            password_hash: "hash".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            role: Role::Employee,
            department: None,
            employee_code: Some("EMP-001".into()),
            is_active: true,
            created_at: created,
            updated_at: login,
            last_login_at: Some(login),
        };

        let value = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(value["full_name"], "Doe Jane");
        assert_eq!(value["last_login_at"], "2026-01-15T00:05:00Z");
        assert!(value.get("password_hash").is_none());
    }
}
