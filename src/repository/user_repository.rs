use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{parse_optional_timestamp, Role, User},
    error::{AppError, Result},
    repository::UserRepository,
};

const COLUMNS: &str = "id, external_id, email, username, role, is_admin, created_at, last_login";

#[derive(FromRow)]
struct UserRow {
    id: String,
    external_id: Option<String>,
    email: String,
    username: Option<String>,
    role: Option<String>,
    is_admin: Option<i32>,
    created_at: Option<String>,
    last_login: Option<String>,
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            external_id: row.external_id,
            email: row.email,
            username: row.username,
            role_raw: row.role,
            legacy_is_admin: row.is_admin.unwrap_or(0) != 0,
            created_at: parse_optional_timestamp(row.created_at.as_deref()),
            last_login: parse_optional_timestamp(row.last_login.as_deref()),
        })
    }

    fn rows_to_users(rows: Vec<UserRow>) -> Result<Vec<User>> {
        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn fetch(&self, id: Uuid) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: User) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, external_id, email, username, role, is_admin, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.role_raw)
        .bind(i32::from(user.legacy_is_admin))
        .bind(user.created_at.unwrap_or(now).naive_utc())
        .bind(user.last_login.map(|dt| dt.naive_utc()))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("User with email {} already exists", user.email))
            }
            other => AppError::from(other),
        })?;

        self.fetch(user.id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = ?", COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE external_id = ?",
            COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower(?)",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_users(rows)
    }

    async fn search_by_email(&self, fragment: &str, limit: i64) -> Result<Vec<User>> {
        let pattern = format!("%{}%", fragment.to_lowercase());
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE lower(email) LIKE ? ORDER BY email LIMIT ?",
            COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_users(rows)
    }

    async fn update_profile(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET external_id = ?, email = ?, username = ?, last_login = ?
            WHERE id = ?
            "#
        )
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.last_login.map(|dt| dt.naive_utc()))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await?;

        self.fetch(user.id).await
    }

    async fn update_role(&self, id: Uuid, role: Role, is_admin: bool) -> Result<User> {
        let result = sqlx::query("UPDATE users SET role = ?, is_admin = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(i32::from(is_admin))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.fetch(id).await
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_logged_in_since(&self, since: DateTime<Utc>) -> Result<i64> {
        // datetime() normalises the stored text layouts before comparing.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE last_login IS NOT NULL AND datetime(last_login) >= datetime(?)"
        )
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
