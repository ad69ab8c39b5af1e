pub mod announcement_service;
pub mod user_service;
pub mod analytics_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::TokenVerifier;
use crate::config::Settings;
use crate::repository::*;
use crate::integrations::{IntegrationManager, LinkShortener, Mailer};
use announcement_service::AnnouncementService;
use user_service::UserService;
use analytics_service::AnalyticsService;

pub use announcement_service::{CreatedAnnouncement, Feed, FeedQuery, FeedSummary, ReviewRequest};
pub use analytics_service::LinkStats;

/// Outbound integrations the services call directly.
#[derive(Clone, Default)]
pub struct Notifiers {
    pub mailer: Option<Arc<dyn Mailer>>,
    pub shortener: Option<Arc<dyn LinkShortener>>,
}

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub engagement_repo: Arc<dyn EngagementRepository>,
    pub integration_manager: Arc<IntegrationManager>,
    pub token_verifier: Option<Arc<TokenVerifier>>,
    pub user_service: Arc<UserService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        integration_manager: Arc<IntegrationManager>,
        notifiers: Notifiers,
        token_verifier: Option<Arc<TokenVerifier>>,
        settings: &Settings,
    ) -> Self {
        // Create repositories
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
        let engagement_repo: Arc<dyn EngagementRepository> =
            Arc::new(SqliteEngagementRepository::new(db_pool.clone()));

        // Create services
        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let announcement_service = Arc::new(AnnouncementService::new(
            announcement_repo.clone(),
            user_repo.clone(),
            notifiers.mailer.clone(),
            notifiers.shortener.clone(),
            settings.announcements.categories.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            announcement_repo.clone(),
            user_repo.clone(),
            engagement_repo.clone(),
            notifiers.shortener,
        ));

        Self {
            user_repo,
            announcement_repo,
            engagement_repo,
            integration_manager,
            token_verifier,
            user_service,
            announcement_service,
            analytics_service,
            db_pool,
        }
    }
}
