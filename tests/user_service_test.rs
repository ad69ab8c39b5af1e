mod common;

use std::sync::Arc;

use campus_board::{
    domain::{IdentityProfile, Role},
    error::AppError,
    repository::{SqliteUserRepository, UserRepository},
    service::user_service::UserService,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn profile(external_id: &str, email: &str, name: Option<&str>) -> IdentityProfile {
    IdentityProfile {
        external_id: external_id.to_string(),
        email: email.to_string(),
        display_name: name.map(str::to_string),
    }
}

#[tokio::test]
async fn test_sync_identity_creates_links_and_refreshes() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let service = UserService::new(repo.clone());
    let now = Utc::now();

    // First sign-in creates a student.
    let created = service
        .sync_identity(profile("idp_1", "asha@campus.edu", Some("Asha")), now)
        .await?;
    assert_eq!(created.role(), Role::Student);
    assert_eq!(created.role_raw.as_deref(), Some("user"));
    assert_eq!(created.external_id.as_deref(), Some("idp_1"));
    assert_eq!(created.username.as_deref(), Some("Asha"));

    // A quick second sign-in changes nothing.
    let again = service
        .sync_identity(profile("idp_1", "asha@campus.edu", Some("Asha")), now + Duration::minutes(5))
        .await?;
    assert_eq!(again.id, created.id);
    assert!((again.last_login.expect("set") - now).num_seconds().abs() <= 1);

    // Hours later, last_login and a changed name are written back.
    let later = now + Duration::hours(3);
    let refreshed = service
        .sync_identity(profile("idp_1", "asha@campus.edu", Some("Asha K")), later)
        .await?;
    assert_eq!(refreshed.id, created.id);
    assert_eq!(refreshed.username.as_deref(), Some("Asha K"));
    assert!((refreshed.last_login.expect("set") - later).num_seconds().abs() <= 1);

    // A pre-existing row with the same email is linked, keeping its role.
    let seeded = common::insert_user(&pool, "Dean@Campus.edu", "superadmin").await?;
    let linked = service
        .sync_identity(profile("idp_2", "dean@campus.edu", None), now)
        .await?;
    assert_eq!(linked.id, seeded.id);
    assert_eq!(linked.external_id.as_deref(), Some("idp_2"));
    assert_eq!(linked.role(), Role::SuperAdmin);

    assert_eq!(repo.count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_role_changes() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));
    let user = common::insert_user(&pool, "kid@campus.edu", "user").await?;

    let promoted = service.set_role(user.id, "student_admin").await?;
    assert_eq!(promoted.role(), Role::StudentAdmin);
    assert!(promoted.legacy_is_admin);

    // Legacy spellings are read, never accepted as input.
    assert!(matches!(service.set_role(user.id, "superadmin").await, Err(AppError::BadRequest(_))));
    assert!(matches!(service.set_role(Uuid::new_v4(), "admin").await, Err(AppError::NotFound(_))));

    let demoted = service.set_admin_status(user.id, false).await?;
    assert_eq!(demoted.role(), Role::Student);
    assert!(!demoted.legacy_is_admin);

    let admin = service.set_admin_status(user.id, true).await?;
    assert_eq!(admin.role(), Role::Admin);

    Ok(())
}

#[tokio::test]
async fn test_dashboard_and_search() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));

    common::insert_user(&pool, "dean@campus.edu", "super_admin").await?;
    common::insert_user(&pool, "office@campus.edu", "admin").await?;
    common::insert_user(&pool, "council@campus.edu", "student_admin").await?;
    for i in 0..4 {
        common::insert_user(&pool, &format!("student{}@campus.edu", i), "user").await?;
    }

    let dashboard = service.dashboard().await?;
    assert_eq!(dashboard.total_users, 7);
    assert_eq!(dashboard.role_breakdown.student, 4);
    assert_eq!(dashboard.role_breakdown.student_admin, 1);
    assert_eq!(dashboard.role_breakdown.admin, 1);
    assert_eq!(dashboard.role_breakdown.super_admin, 1);
    assert_eq!(dashboard.recent_users.len(), 5);

    let students = service.list(Some("STUDENT")).await?;
    assert_eq!(students.len(), 4);
    assert_eq!(service.list(Some("  ")).await?.len(), 7);

    Ok(())
}
