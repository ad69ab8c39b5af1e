use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

/// How stale `last_login` may get before a sign-in writes it again.
const LOGIN_REFRESH_INTERVAL_HOURS: i64 = 1;
const RECENT_USERS: usize = 5;
const SEARCH_LIMIT: i64 = 50;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Map an identity-provider profile onto a local user, creating or
    /// linking the row as needed.
    pub async fn sync_identity(&self, profile: IdentityProfile, now: DateTime<Utc>) -> Result<User> {
        if let Some(user) = self.repo.find_by_external_id(&profile.external_id).await? {
            return self.refresh(user, &profile, now).await;
        }

        if let Some(mut user) = self.repo.find_by_email(&profile.email).await? {
            tracing::info!(user_id = %user.id, "Linking existing user to identity provider account");
            user.external_id = Some(profile.external_id.clone());
            if profile.display_name.is_some() {
                user.username = profile.display_name.clone();
            }
            user.last_login = Some(now);
            return self.repo.update_profile(&user).await;
        }

        let user = User {
            id: Uuid::new_v4(),
            external_id: Some(profile.external_id),
            email: profile.email,
            username: profile.display_name,
            // Legacy spelling; normalised to student on read.
            role_raw: Some("user".to_string()),
            legacy_is_admin: false,
            created_at: Some(now),
            last_login: Some(now),
        };

        let created = self.repo.create(user).await?;
        tracing::info!(user_id = %created.id, "Created user from identity provider");
        Ok(created)
    }

    async fn refresh(&self, mut user: User, profile: &IdentityProfile, now: DateTime<Utc>) -> Result<User> {
        let profile_changed = user.email != profile.email
            || (profile.display_name.is_some() && user.username != profile.display_name);
        let stale = user
            .last_login
            .map(|last| now - last > Duration::hours(LOGIN_REFRESH_INTERVAL_HOURS))
            .unwrap_or(true);

        if !profile_changed && !stale {
            return Ok(user);
        }

        user.email = profile.email.clone();
        if profile.display_name.is_some() {
            user.username = profile.display_name.clone();
        }
        user.last_login = Some(now);
        self.repo.update_profile(&user).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list(&self, email: Option<&str>) -> Result<Vec<User>> {
        match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(fragment) => self.repo.search_by_email(fragment, SEARCH_LIMIT).await,
            None => self.repo.list_all().await,
        }
    }

    /// Accepts canonical role names only.
    pub async fn set_role(&self, id: Uuid, raw_role: &str) -> Result<User> {
        let role = Role::parse_canonical(raw_role.trim()).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Role must be one of: {}",
                Role::ALL.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
            ))
        })?;

        let user = self.get(id).await?;
        let updated = self.repo.update_role(user.id, role, role.has_admin_access()).await?;
        tracing::info!(user_id = %id, role = role.as_str(), "User role updated");
        Ok(updated)
    }

    /// Legacy toggle: `true` makes the user an admin, `false` a student.
    pub async fn set_admin_status(&self, id: Uuid, is_admin: bool) -> Result<User> {
        let role = if is_admin { Role::Admin } else { Role::Student };
        let user = self.get(id).await?;
        let updated = self.repo.update_role(user.id, role, is_admin).await?;
        tracing::info!(user_id = %id, is_admin, "User admin status updated");
        Ok(updated)
    }

    pub async fn dashboard(&self) -> Result<AdminDashboard> {
        let users = self.repo.list_all().await?;
        Ok(AdminDashboard {
            total_users: users.len() as i64,
            role_breakdown: RoleBreakdown::tally(&users),
            recent_users: users.iter().take(RECENT_USERS).map(UserProfile::from).collect(),
        })
    }
}
