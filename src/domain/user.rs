use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject identifier issued by the identity provider.
    pub external_id: Option<String>,
    pub email: String,
    pub username: Option<String>,
    /// Raw stored role, possibly a legacy alias. Use [`User::role`].
    pub role_raw: Option<String>,
    pub legacy_is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::normalize(self.role_raw.as_deref(), self.legacy_is_admin)
    }

    pub fn email_domain(&self) -> Option<String> {
        email_domain(&self.email)
    }
}

/// Lower-cased part after the single `@`, if the address has exactly one.
pub fn email_domain(email: &str) -> Option<String> {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
            Some(domain.to_lowercase())
        }
        _ => None,
    }
}

/// Profile fields taken from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Outward view of a user with the role already normalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub role_display: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub access_level: u8,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        let role = user.role();
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role,
            role_display: role.display_name().to_string(),
            is_admin: role.has_admin_access(),
            is_super_admin: role == Role::SuperAdmin,
            access_level: role.access_level(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBreakdown {
    pub student: i64,
    pub student_admin: i64,
    pub admin: i64,
    pub super_admin: i64,
}

impl RoleBreakdown {
    pub fn tally<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut breakdown = Self::default();
        for user in users {
            match user.role() {
                Role::Student => breakdown.student += 1,
                Role::StudentAdmin => breakdown.student_admin += 1,
                Role::Admin => breakdown.admin += 1,
                Role::SuperAdmin => breakdown.super_admin += 1,
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub role_breakdown: RoleBreakdown,
    pub recent_users: Vec<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAdminStatusRequest {
    pub is_admin: bool,
}
