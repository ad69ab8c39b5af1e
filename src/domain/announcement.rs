use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::timestamp::double_option;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub author_id: Option<Uuid>,
    pub status: AnnouncementStatus,
    pub is_active: bool,
    pub is_emergency: bool,
    pub expiry_date: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub priority_until: Option<DateTime<Utc>>,
    pub emergency_expires_at: Option<DateTime<Utc>>,
    pub views_count: i64,
    pub clicks_count: i64,
    pub send_email: bool,
    pub email_sent: bool,
    pub link: Option<String>,
    pub short_code: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Announcement {
    /// Expiry is always recomputed; it is never a stored fact.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expiry_date, now)
    }

    /// Pinned while `priority_until` is in the future and the status is
    /// literally `urgent`. Both conditions are required.
    pub fn has_active_priority_window(&self, now: DateTime<Utc>) -> bool {
        self.status == AnnouncementStatus::Urgent
            && self.priority_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn is_scheduled_for_future(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at.map(|at| at > now).unwrap_or(false)
    }
}

/// No expiry date means never expired; otherwise expired strictly after it.
pub fn is_expired(expiry_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry_date {
        Some(expiry) => expiry < now,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Scheduled,
    Active,
    Urgent,
    Expired,
}

impl AnnouncementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnouncementStatus::Draft => "draft",
            AnnouncementStatus::UnderReview => "under_review",
            AnnouncementStatus::Approved => "approved",
            AnnouncementStatus::Rejected => "rejected",
            AnnouncementStatus::Scheduled => "scheduled",
            AnnouncementStatus::Active => "active",
            AnnouncementStatus::Urgent => "urgent",
            AnnouncementStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(AnnouncementStatus::Draft),
            "under_review" => Some(AnnouncementStatus::UnderReview),
            "approved" => Some(AnnouncementStatus::Approved),
            "rejected" => Some(AnnouncementStatus::Rejected),
            "scheduled" => Some(AnnouncementStatus::Scheduled),
            "active" => Some(AnnouncementStatus::Active),
            "urgent" => Some(AnnouncementStatus::Urgent),
            "expired" => Some(AnnouncementStatus::Expired),
            _ => None,
        }
    }

    /// Statuses an author may pick when creating. Review outcomes and
    /// `expired` are reached through transitions only.
    pub fn is_initial(self) -> bool {
        matches!(
            self,
            AnnouncementStatus::Draft
                | AnnouncementStatus::UnderReview
                | AnnouncementStatus::Scheduled
                | AnnouncementStatus::Active
                | AnnouncementStatus::Urgent
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Accept,
    Reject,
    SendBack,
}

impl ReviewAction {
    /// Review only applies to announcements waiting in `under_review`.
    pub fn apply(self, current: AnnouncementStatus) -> Option<AnnouncementStatus> {
        if current != AnnouncementStatus::UnderReview {
            return None;
        }
        Some(match self {
            ReviewAction::Accept => AnnouncementStatus::Approved,
            ReviewAction::Reject => AnnouncementStatus::Rejected,
            ReviewAction::SendBack => AnnouncementStatus::Draft,
        })
    }
}

fn default_true() -> bool {
    true
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub title: String,
    #[validate(custom(function = "not_blank"), length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub emergency_expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub status: Option<AnnouncementStatus>,
    #[serde(default)]
    pub send_email: bool,
    /// Blank means no link; checked by the service.
    #[serde(default)]
    pub link: Option<String>,
}

/// Partial update. Timestamp fields use `Some(None)` for an explicit clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAnnouncementRequest {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority_until: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub emergency_expires_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
    pub is_emergency: Option<bool>,
    pub status: Option<AnnouncementStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
}

impl UpdateAnnouncementRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.expiry_date.is_none()
            && self.scheduled_at.is_none()
            && self.priority_until.is_none()
            && self.emergency_expires_at.is_none()
            && self.is_active.is_none()
            && self.is_emergency.is_none()
            && self.status.is_none()
            && self.link.is_none()
    }

    /// Apply the patch onto an existing announcement in place.
    pub fn apply_to(self, announcement: &mut Announcement) {
        if let Some(title) = self.title {
            announcement.title = title;
        }
        if let Some(description) = self.description {
            announcement.description = description;
        }
        if let Some(category) = self.category {
            announcement.category = category;
        }
        if let Some(expiry_date) = self.expiry_date {
            announcement.expiry_date = expiry_date;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            announcement.scheduled_at = scheduled_at;
        }
        if let Some(priority_until) = self.priority_until {
            announcement.priority_until = priority_until;
        }
        if let Some(emergency_expires_at) = self.emergency_expires_at {
            announcement.emergency_expires_at = emergency_expires_at;
        }
        if let Some(is_active) = self.is_active {
            announcement.is_active = is_active;
        }
        if let Some(is_emergency) = self.is_emergency {
            announcement.is_emergency = is_emergency;
        }
        if let Some(status) = self.status {
            announcement.status = status;
        }
        if let Some(link) = self.link {
            announcement.link = link;
        }
    }
}
