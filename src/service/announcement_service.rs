use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    integrations::{LinkShortener, Mailer},
    repository::{AnnouncementRepository, UserRepository},
};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub announcements: Vec<Announcement>,
    /// Matches after filtering, before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub total: usize,
    pub emergency: usize,
    pub pinned: usize,
    pub by_category: BTreeMap<String, usize>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedAnnouncement {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub email_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,
}

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
    user_repo: Arc<dyn UserRepository>,
    mailer: Option<Arc<dyn Mailer>>,
    shortener: Option<Arc<dyn LinkShortener>>,
    categories: Vec<String>,
}

impl AnnouncementService {
    pub fn new(
        repo: Arc<dyn AnnouncementRepository>,
        user_repo: Arc<dyn UserRepository>,
        mailer: Option<Arc<dyn Mailer>>,
        shortener: Option<Arc<dyn LinkShortener>>,
        categories: Vec<String>,
    ) -> Self {
        Self { repo, user_repo, mailer, shortener, categories }
    }

    /// Everything `viewer` may see at `now`, in display order.
    pub async fn visible(&self, viewer: &Viewer, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        let all = self.repo.list_all().await?;
        let visible = all
            .into_iter()
            .filter(|announcement| is_visible(announcement, viewer, now))
            .collect();
        Ok(rank_by_priority(visible, now))
    }

    pub async fn feed(&self, viewer: &Viewer, query: &FeedQuery, now: DateTime<Utc>) -> Result<Feed> {
        let mut announcements = self.visible(viewer, now).await?;

        if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
            announcements = filter_by_category(announcements, category.trim());
        }
        if let Some(q) = query.q.as_deref() {
            announcements = search_by_text(announcements, q);
        }

        let total = announcements.len();
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let page = announcements.into_iter().skip(offset).take(limit).collect();

        Ok(Feed { announcements: page, total, limit, offset })
    }

    pub async fn summary(&self, viewer: &Viewer, now: DateTime<Utc>) -> Result<FeedSummary> {
        let announcements = self.visible(viewer, now).await?;

        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for announcement in &announcements {
            *by_category.entry(announcement.category.to_lowercase()).or_default() += 1;
        }

        Ok(FeedSummary {
            total: announcements.len(),
            emergency: announcements.iter().filter(|a| a.is_emergency).count(),
            pinned: announcements
                .iter()
                .filter(|a| a.has_active_priority_window(now))
                .count(),
            categories: by_category.keys().cloned().collect(),
            by_category,
        })
    }

    /// Not-visible and missing are indistinguishable to the caller.
    pub async fn get_visible(&self, id: Uuid, viewer: &Viewer, now: DateTime<Utc>) -> Result<Announcement> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|announcement| is_visible(announcement, viewer, now))
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    pub async fn create(
        &self,
        actor: &User,
        request: CreateAnnouncementRequest,
        now: DateTime<Utc>,
    ) -> Result<CreatedAnnouncement> {
        if !actor.role().has_admin_access() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        request.validate()?;
        self.check_category(&request.category)?;
        let link = normalize_link(request.link)?;

        if let Some(status) = request.status {
            if !status.is_initial() {
                return Err(AppError::BadRequest(format!(
                    "Announcements cannot be created with status {}",
                    status.as_str()
                )));
            }
        }

        let in_priority_window = request.priority_until.map(|until| until > now).unwrap_or(false);
        let scheduled_for_later = request.scheduled_at.map(|at| at > now).unwrap_or(false);

        // The priority window wins for status, the schedule wins for activation.
        let status = if in_priority_window {
            AnnouncementStatus::Urgent
        } else if scheduled_for_later {
            AnnouncementStatus::Scheduled
        } else {
            request.status.unwrap_or(AnnouncementStatus::Active)
        };
        let is_active = if scheduled_for_later {
            false
        } else {
            in_priority_window || request.is_active
        };

        let short_code = match link.as_deref() {
            Some(url) => self.try_shorten(url).await,
            None => None,
        };

        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            category: request.category.trim().to_string(),
            author_id: Some(actor.id),
            status,
            is_active,
            is_emergency: request.is_emergency,
            expiry_date: request.expiry_date,
            scheduled_at: request.scheduled_at,
            priority_until: request.priority_until,
            emergency_expires_at: request.emergency_expires_at,
            views_count: 0,
            clicks_count: 0,
            send_email: request.send_email,
            email_sent: false,
            link,
            short_code,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let mut created = self.repo.create(announcement).await?;
        tracing::info!(
            announcement_id = %created.id,
            author = %actor.id,
            status = created.status.as_str(),
            "Announcement created"
        );

        let mut email_message = None;
        if (created.send_email || created.is_emergency) && !scheduled_for_later {
            email_message = Some(self.notify(&mut created).await);
        }

        Ok(CreatedAnnouncement { announcement: created, email_message })
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        patch: UpdateAnnouncementRequest,
    ) -> Result<Announcement> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        patch.validate()?;
        if let Some(category) = patch.category.as_deref() {
            self.check_category(category)?;
        }

        let mut announcement = self.find(id).await?;
        self.ensure_can_manage(actor, &announcement).await?;

        let previous_link = announcement.link.clone();
        patch.apply_to(&mut announcement);
        announcement.title = announcement.title.trim().to_string();
        announcement.description = announcement.description.trim().to_string();
        announcement.link = normalize_link(announcement.link)?;

        if announcement.link != previous_link {
            announcement.short_code = match announcement.link.as_deref() {
                Some(url) => self.try_shorten(url).await,
                None => None,
            };
        }

        let updated = self.repo.update(announcement).await?;
        tracing::info!(announcement_id = %id, actor = %actor.id, "Announcement updated");
        Ok(updated)
    }

    pub async fn review(&self, actor: &User, id: Uuid, action: ReviewAction) -> Result<Announcement> {
        if !actor.role().has_admin_access() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let announcement = self.find(id).await?;
        let next = action.apply(announcement.status).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Only announcements under review can be reviewed (current status: {})",
                announcement.status.as_str()
            ))
        })?;

        let reviewed = self.repo.set_status(id, next).await?;
        tracing::info!(
            announcement_id = %id,
            reviewer = %actor.id,
            status = next.as_str(),
            "Announcement reviewed"
        );
        Ok(reviewed)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<()> {
        let announcement = self.find(id).await?;
        self.ensure_can_manage(actor, &announcement).await?;

        self.repo.delete(id).await?;
        tracing::info!(announcement_id = %id, actor = %actor.id, "Announcement deleted");
        Ok(())
    }

    /// Admin-tier actors may manage their own announcements and those whose
    /// author does not outrank them in announcement priority.
    pub async fn ensure_can_manage(&self, actor: &User, announcement: &Announcement) -> Result<()> {
        let actor_role = actor.role();
        if !actor_role.has_admin_access() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let Some(author_id) = announcement.author_id else {
            return Ok(());
        };
        if author_id == actor.id {
            return Ok(());
        }

        match self.user_repo.find_by_id(author_id).await? {
            Some(author) if author.role().outranks(actor_role) => {
                Err(AppError::Forbidden(format!(
                    "A {} cannot modify announcements by a {}",
                    actor_role.display_name(),
                    author.role().display_name()
                )))
            }
            _ => Ok(()),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Announcement> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    fn check_category(&self, category: &str) -> Result<()> {
        let category = category.trim();
        if self.categories.iter().any(|known| known.eq_ignore_ascii_case(category)) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Unknown category '{}'. Expected one of: {}",
                category,
                self.categories.join(", ")
            )))
        }
    }

    async fn try_shorten(&self, url: &str) -> Option<String> {
        let shortener = self.shortener.as_ref()?;
        match shortener.shorten(url).await {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!("Link shortening failed, keeping the original link: {}", e);
                None
            }
        }
    }

    /// Sends the notification email. Failures are reported, never propagated.
    async fn notify(&self, announcement: &mut Announcement) -> String {
        let Some(mailer) = self.mailer.as_ref() else {
            return "Email notifications are not configured".to_string();
        };

        match mailer.send_announcement(announcement).await {
            Ok(recipients) => {
                if let Err(e) = self.repo.mark_email_sent(announcement.id).await {
                    tracing::error!("Failed to record email delivery for {}: {}", announcement.id, e);
                }
                announcement.email_sent = true;
                format!("Email sent to {} recipient(s)", recipients)
            }
            Err(e) => {
                tracing::warn!("Announcement email for {} not sent: {}", announcement.id, e);
                e.to_string()
            }
        }
    }
}

/// Trims the link; blank becomes `None`, anything else must parse as an http(s) URL.
pub fn normalize_link(link: Option<String>) -> Result<Option<String>> {
    let Some(link) = link else {
        return Ok(None);
    };
    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    match reqwest::Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(Some(link.to_string())),
        _ => Err(AppError::Validation("Link must be an http(s) URL".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_link() {
        assert_eq!(normalize_link(None).unwrap(), None);
        assert_eq!(normalize_link(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            normalize_link(Some("  https://campus.edu/fest ".to_string())).unwrap(),
            Some("https://campus.edu/fest".to_string())
        );
        assert!(normalize_link(Some("ftp://campus.edu".to_string())).is_err());
        assert!(normalize_link(Some("javascript:alert(1)".to_string())).is_err());
        assert!(normalize_link(Some("not a url".to_string())).is_err());
    }
}
