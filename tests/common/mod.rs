#![allow(dead_code)]

use campus_board::{
    domain::{Announcement, AnnouncementStatus, User},
    repository::{SqliteUserRepository, UserRepository},
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// Fresh in-memory database with migrations applied. A single connection
/// keeps every query on the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

pub fn user(email: &str, role: &str) -> User {
    User {
        id: Uuid::new_v4(),
        external_id: None,
        email: email.to_string(),
        username: None,
        role_raw: Some(role.to_string()),
        legacy_is_admin: false,
        created_at: None,
        last_login: None,
    }
}

pub async fn insert_user(pool: &SqlitePool, email: &str, role: &str) -> anyhow::Result<User> {
    let repo = SqliteUserRepository::new(pool.clone());
    Ok(repo.create(user(email, role)).await?)
}

pub fn announcement(title: &str, author: Option<&User>, now: DateTime<Utc>) -> Announcement {
    Announcement {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{} details", title),
        category: "college".to_string(),
        author_id: author.map(|a| a.id),
        status: AnnouncementStatus::Active,
        is_active: true,
        is_emergency: false,
        expiry_date: None,
        scheduled_at: None,
        priority_until: None,
        emergency_expires_at: None,
        views_count: 0,
        clicks_count: 0,
        send_email: false,
        email_sent: false,
        link: None,
        short_code: None,
        created_at: Some(now),
        updated_at: Some(now),
    }
}
