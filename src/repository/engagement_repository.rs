use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    domain::{Engagement, EngagementKind},
    error::Result,
    repository::EngagementRepository,
};

pub struct SqliteEngagementRepository {
    pool: SqlitePool,
}

impl SqliteEngagementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementRepository for SqliteEngagementRepository {
    async fn record(&self, engagement: Engagement) -> Result<Engagement> {
        sqlx::query(
            r#"
            INSERT INTO announcement_engagements (id, announcement_id, user_id, event_type, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(engagement.id.to_string())
        .bind(engagement.announcement_id.to_string())
        .bind(engagement.user_id.map(|id| id.to_string()))
        .bind(engagement.kind.as_str())
        .bind(engagement.created_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(engagement)
    }

    async fn count_for(&self, announcement_id: Uuid, kind: EngagementKind) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM announcement_engagements WHERE announcement_id = ? AND event_type = ?"
        )
        .bind(announcement_id.to_string())
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
