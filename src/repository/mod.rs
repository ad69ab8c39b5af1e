use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod announcement_repository;
pub mod engagement_repository;

pub use user_repository::SqliteUserRepository;
pub use announcement_repository::SqliteAnnouncementRepository;
pub use engagement_repository::SqliteEngagementRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_all(&self) -> Result<Vec<User>>;
    async fn search_by_email(&self, fragment: &str, limit: i64) -> Result<Vec<User>>;
    /// Rewrites the identity-provider fields and `last_login`.
    async fn update_profile(&self, user: &User) -> Result<User>;
    async fn update_role(&self, id: Uuid, role: Role, is_admin: bool) -> Result<User>;
    async fn count(&self) -> Result<i64>;
    async fn count_logged_in_since(&self, since: DateTime<Utc>) -> Result<i64>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    /// Every stored announcement, newest first. Visibility is decided by the caller.
    async fn list_all(&self) -> Result<Vec<Announcement>>;
    async fn update(&self, announcement: Announcement) -> Result<Announcement>;
    async fn set_status(&self, id: Uuid, status: AnnouncementStatus) -> Result<Announcement>;
    async fn mark_email_sent(&self, id: Uuid) -> Result<()>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn increment_clicks(&self, id: Uuid) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn count(&self) -> Result<i64>;
    async fn total_views(&self) -> Result<i64>;
    async fn top_by_views(&self, limit: i64) -> Result<Vec<TopAnnouncement>>;
}

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    async fn record(&self, engagement: Engagement) -> Result<Engagement>;
    async fn count_for(&self, announcement_id: Uuid, kind: EngagementKind) -> Result<i64>;
}
