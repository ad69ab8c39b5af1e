use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    integrations::LinkShortener,
    repository::{AnnouncementRepository, EngagementRepository, UserRepository},
};

const ACTIVE_USER_WINDOW_DAYS: i64 = 30;
const TOP_ANNOUNCEMENTS: i64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LinkStats {
    pub announcement_id: Uuid,
    pub short_code: Option<String>,
    /// Clicks reported by the shortener.
    pub total_clicks: i64,
    /// Clicks counted by our own redirect endpoint.
    pub tracked_clicks: i64,
    pub message: Option<String>,
}

pub struct AnalyticsService {
    announcements: Arc<dyn AnnouncementRepository>,
    users: Arc<dyn UserRepository>,
    engagements: Arc<dyn EngagementRepository>,
    shortener: Option<Arc<dyn LinkShortener>>,
}

impl AnalyticsService {
    pub fn new(
        announcements: Arc<dyn AnnouncementRepository>,
        users: Arc<dyn UserRepository>,
        engagements: Arc<dyn EngagementRepository>,
        shortener: Option<Arc<dyn LinkShortener>>,
    ) -> Self {
        Self { announcements, users, engagements, shortener }
    }

    pub async fn track(
        &self,
        viewer: &Viewer,
        request: TrackEngagementRequest,
        now: DateTime<Utc>,
    ) -> Result<Engagement> {
        self.visible(request.announcement_id, viewer, now).await?;
        self.record(request.announcement_id, viewer, request.event_type, now).await
    }

    /// Records a click and returns where to send the viewer.
    pub async fn redirect_target(&self, viewer: &Viewer, id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let announcement = self.visible(id, viewer, now).await?;

        let short_url = announcement
            .short_code
            .as_deref()
            .zip(self.shortener.as_ref())
            .map(|(code, shortener)| shortener.short_url(code));
        let target = short_url
            .or(announcement.link)
            .ok_or_else(|| AppError::NotFound("No URL available for this announcement".to_string()))?;

        // Tracking failures must not block the redirect.
        if let Err(e) = self.record(id, viewer, EngagementKind::Click, now).await {
            tracing::error!("Failed to track click for {}: {}", id, e);
        }

        Ok(target)
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<AnalyticsStats> {
        let since = now - Duration::days(ACTIVE_USER_WINDOW_DAYS);
        Ok(AnalyticsStats {
            total_announcements: self.announcements.count().await?,
            total_views: self.announcements.total_views().await?,
            total_users: self.users.count().await?,
            active_users: self.users.count_logged_in_since(since).await?,
            top_announcements: self.announcements.top_by_views(TOP_ANNOUNCEMENTS).await?,
        })
    }

    pub async fn link_stats(&self, id: Uuid) -> Result<LinkStats> {
        let announcement = self
            .announcements
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        let mut stats = LinkStats {
            announcement_id: id,
            short_code: announcement.short_code.clone(),
            total_clicks: 0,
            tracked_clicks: announcement.clicks_count,
            message: None,
        };

        let Some(code) = announcement.short_code.as_deref() else {
            stats.message = Some("This announcement has no short link".to_string());
            return Ok(stats);
        };

        match self.shortener.as_ref() {
            Some(shortener) => match shortener.total_clicks(code).await {
                Ok(clicks) => stats.total_clicks = clicks,
                Err(e) => {
                    tracing::warn!("Shortener stats for {} unavailable: {}", code, e);
                    stats.message = Some(
                        "Shortener stats are currently unavailable. Clicks are still tracked internally."
                            .to_string(),
                    );
                }
            },
            None => stats.message = Some("Link shortener is not configured".to_string()),
        }

        Ok(stats)
    }

    async fn visible(&self, id: Uuid, viewer: &Viewer, now: DateTime<Utc>) -> Result<Announcement> {
        self.announcements
            .find_by_id(id)
            .await?
            .filter(|announcement| is_visible(announcement, viewer, now))
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    async fn record(
        &self,
        announcement_id: Uuid,
        viewer: &Viewer,
        kind: EngagementKind,
        now: DateTime<Utc>,
    ) -> Result<Engagement> {
        let engagement = self
            .engagements
            .record(Engagement {
                id: Uuid::new_v4(),
                announcement_id,
                user_id: viewer.id,
                kind,
                created_at: now,
            })
            .await?;

        match kind {
            EngagementKind::View => self.announcements.increment_views(announcement_id).await?,
            EngagementKind::Click => self.announcements.increment_clicks(announcement_id).await?,
            EngagementKind::Dismiss => {}
        }

        tracing::debug!(%announcement_id, kind = kind.as_str(), "Engagement recorded");
        Ok(engagement)
    }
}
