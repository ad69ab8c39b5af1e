use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{parse_optional_timestamp, Announcement, AnnouncementStatus, TopAnnouncement},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

const COLUMNS: &str = r#"
    id, title, description, category, author_id, status, is_active, is_emergency,
    expiry_date, scheduled_at, priority_until, emergency_expires_at,
    views_count, clicks_count, send_email, email_sent, link, short_code,
    created_at, updated_at
"#;

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    description: String,
    category: String,
    author_id: Option<String>,
    status: Option<String>,
    is_active: i32,
    is_emergency: i32,
    expiry_date: Option<String>,
    scheduled_at: Option<String>,
    priority_until: Option<String>,
    emergency_expires_at: Option<String>,
    views_count: i64,
    clicks_count: i64,
    send_email: i32,
    email_sent: i32,
    link: Option<String>,
    short_code: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(FromRow)]
struct TopRow {
    id: String,
    title: String,
    views_count: i64,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        let id = Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?;
        // A dangling or malformed author reference only loses the ownership link.
        let author_id = row.author_id.as_deref().and_then(|s| Uuid::parse_str(s).ok());

        Ok(Announcement {
            id,
            title: row.title,
            description: row.description,
            category: row.category,
            author_id,
            status: Self::parse_status(id, row.status.as_deref()),
            is_active: row.is_active != 0,
            is_emergency: row.is_emergency != 0,
            expiry_date: parse_optional_timestamp(row.expiry_date.as_deref()),
            scheduled_at: parse_optional_timestamp(row.scheduled_at.as_deref()),
            priority_until: parse_optional_timestamp(row.priority_until.as_deref()),
            emergency_expires_at: parse_optional_timestamp(row.emergency_expires_at.as_deref()),
            views_count: row.views_count,
            clicks_count: row.clicks_count,
            send_email: row.send_email != 0,
            email_sent: row.email_sent != 0,
            link: row.link,
            short_code: row.short_code,
            created_at: parse_optional_timestamp(row.created_at.as_deref()),
            updated_at: parse_optional_timestamp(row.updated_at.as_deref()),
        })
    }

    fn parse_status(id: Uuid, raw: Option<&str>) -> AnnouncementStatus {
        match raw.and_then(AnnouncementStatus::parse) {
            Some(status) => status,
            None => {
                tracing::warn!("Announcement {} has unknown status {:?}, treating as draft", id, raw);
                AnnouncementStatus::Draft
            }
        }
    }

    fn naive(dt: Option<DateTime<Utc>>) -> Option<chrono::NaiveDateTime> {
        dt.map(|dt| dt.naive_utc())
    }

    async fn fetch(&self, id: Uuid) -> Result<Announcement> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Announcement {} not found", id)))
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        let now = Utc::now();
        let created_at = announcement.created_at.unwrap_or(now).naive_utc();

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, title, description, category, author_id, status, is_active, is_emergency,
                expiry_date, scheduled_at, priority_until, emergency_expires_at,
                views_count, clicks_count, send_email, email_sent, link, short_code,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(announcement.id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.description)
        .bind(&announcement.category)
        .bind(announcement.author_id.map(|id| id.to_string()))
        .bind(announcement.status.as_str())
        .bind(i32::from(announcement.is_active))
        .bind(i32::from(announcement.is_emergency))
        .bind(Self::naive(announcement.expiry_date))
        .bind(Self::naive(announcement.scheduled_at))
        .bind(Self::naive(announcement.priority_until))
        .bind(Self::naive(announcement.emergency_expires_at))
        .bind(announcement.views_count)
        .bind(announcement.clicks_count)
        .bind(i32::from(announcement.send_email))
        .bind(i32::from(announcement.email_sent))
        .bind(&announcement.link)
        .bind(&announcement.short_code)
        .bind(created_at)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_announcement).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn update(&self, announcement: Announcement) -> Result<Announcement> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, description = ?, category = ?, status = ?,
                is_active = ?, is_emergency = ?,
                expiry_date = ?, scheduled_at = ?, priority_until = ?, emergency_expires_at = ?,
                link = ?, short_code = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.description)
        .bind(&announcement.category)
        .bind(announcement.status.as_str())
        .bind(i32::from(announcement.is_active))
        .bind(i32::from(announcement.is_emergency))
        .bind(Self::naive(announcement.expiry_date))
        .bind(Self::naive(announcement.scheduled_at))
        .bind(Self::naive(announcement.priority_until))
        .bind(Self::naive(announcement.emergency_expires_at))
        .bind(&announcement.link)
        .bind(&announcement.short_code)
        .bind(now)
        .bind(announcement.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Announcement {} not found", announcement.id)));
        }

        self.fetch(announcement.id).await
    }

    async fn set_status(&self, id: Uuid, status: AnnouncementStatus) -> Result<Announcement> {
        let result = sqlx::query("UPDATE announcements SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Announcement {} not found", id)));
        }

        self.fetch(id).await
    }

    async fn mark_email_sent(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE announcements SET email_sent = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE announcements SET views_count = views_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_clicks(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE announcements SET clicks_count = clicks_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Announcement {} not found", id)));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn total_views(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(views_count), 0) FROM announcements")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn top_by_views(&self, limit: i64) -> Result<Vec<TopAnnouncement>> {
        let rows = sqlx::query_as::<_, TopRow>(
            r#"
            SELECT id, title, views_count
            FROM announcements
            ORDER BY views_count DESC, created_at DESC
            LIMIT ?
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TopAnnouncement {
                    id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
                    title: row.title,
                    views: row.views_count,
                })
            })
            .collect()
    }
}
