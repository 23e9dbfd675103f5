use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, prelude::FromRow};
use tracing::info;

use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::model::user::User;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, role, department,
    employee_code, is_active, created_at, updated_at, last_login_at
"#;

#[derive(FromRow)]
struct UserSql {
    id: u64,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    department: Option<String>,
    employee_code: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserSql> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserSql) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: Box::new(e),
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            department: row.department,
            employee_code: row.employee_code,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        })
    }
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub department: Option<&'a str>,
    pub employee_code: Option<&'a str>,
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    sqlx::query_as::<_, UserSql>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(User::try_from)
        .transpose()
}

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, UserSql>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(User::try_from)
        .transpose()
}

pub async fn list(pool: &MySqlPool, offset: u64, limit: u64) -> Result<Vec<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?");
    sqlx::query_as::<_, UserSql>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

pub async fn count(pool: &MySqlPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Inserts and returns the new id. Duplicate email/employee code surfaces
/// as a database error with SQLSTATE 23000.
pub async fn insert(pool: &MySqlPool, user: &NewUser<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users
            (email, password_hash, first_name, last_name, role, department, employee_code, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.role.as_ref())
    .bind(user.department)
    .bind(user.employee_code)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Returns false if no such user.
pub async fn set_active(pool: &MySqlPool, id: u64, active: bool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_login(pool: &MySqlPool, id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create the configured admin account on first start.
pub async fn ensure_admin(pool: &MySqlPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if find_by_email(pool, &email).await?.is_some() {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hashing admin password: {e}"))?;
    let id = insert(
        pool,
        &NewUser {
            email: &email,
            password_hash: &hashed,
            first_name: "Admin",
            last_name: "System",
            role: Role::Admin,
            department: None,
            employee_code: None,
        },
    )
    .await?;

    info!(user_id = id, email = %email, "Bootstrap admin created");
    Ok(())
}
