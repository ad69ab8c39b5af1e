use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    View,
    Click,
    Dismiss,
}

impl EngagementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementKind::View => "view",
            EngagementKind::Click => "click",
            EngagementKind::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: EngagementKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEngagementRequest {
    pub announcement_id: Uuid,
    pub event_type: EngagementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAnnouncement {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsStats {
    pub total_announcements: i64,
    pub total_views: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub top_announcements: Vec<TopAnnouncement>,
}
