mod common;

use campus_board::{
    domain::{AnnouncementStatus, Engagement, EngagementKind},
    error::AppError,
    repository::{
        AnnouncementRepository, EngagementRepository, SqliteAnnouncementRepository,
        SqliteEngagementRepository,
    },
};
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

#[tokio::test]
async fn test_announcement_crud() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let author = common::insert_user(&pool, "office@campus.edu", "admin").await?;
    let repo = SqliteAnnouncementRepository::new(pool.clone());
    let now = Utc::now();

    // Create
    let mut draft = common::announcement("Library hours", Some(&author), now);
    draft.expiry_date = Some(now + Duration::days(3));
    draft.link = Some("https://campus.edu/library".to_string());
    let created = repo.create(draft).await?;
    assert_eq!(created.title, "Library hours");
    assert_eq!(created.author_id, Some(author.id));
    assert_eq!(created.status, AnnouncementStatus::Active);
    assert!(created.is_active);
    let expiry = created.expiry_date.expect("expiry survives the round trip");
    assert!((expiry - (now + Duration::days(3))).num_seconds().abs() <= 1);

    // Find
    let found = repo.find_by_id(created.id).await?;
    assert_eq!(found.map(|a| a.id), Some(created.id));
    assert!(repo.find_by_id(Uuid::new_v4()).await?.is_none());

    // Update
    let mut changed = created.clone();
    changed.title = "Library hours (revised)".to_string();
    changed.is_emergency = true;
    changed.link = None;
    let updated = repo.update(changed).await?;
    assert_eq!(updated.title, "Library hours (revised)");
    assert!(updated.is_emergency);
    assert_eq!(updated.link, None);

    // Status change
    let archived = repo.set_status(created.id, AnnouncementStatus::Expired).await?;
    assert_eq!(archived.status, AnnouncementStatus::Expired);

    // Delete
    repo.delete(created.id).await?;
    assert!(repo.find_by_id(created.id).await?.is_none());
    assert!(matches!(repo.delete(created.id).await, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_all_is_newest_first() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAnnouncementRepository::new(pool);
    let now = Utc::now();

    repo.create(common::announcement("Older", None, now - Duration::hours(2))).await?;
    repo.create(common::announcement("Newest", None, now)).await?;
    repo.create(common::announcement("Middle", None, now - Duration::hours(1))).await?;

    let titles: Vec<String> = repo.list_all().await?.into_iter().map(|a| a.title).collect();
    assert_eq!(titles, vec!["Newest", "Middle", "Older"]);

    Ok(())
}

#[tokio::test]
async fn test_lenient_rows_are_still_readable() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAnnouncementRepository::new(pool.clone());
    let id = Uuid::new_v4();

    // Rows written by older clients: RFC 3339 timestamps, garbage dates,
    // a status this build does not know, and a dangling author reference.
    sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await?;
    sqlx::query(
        r#"
        INSERT INTO announcements (id, title, description, category, author_id, status,
                                   expiry_date, scheduled_at, created_at)
        VALUES (?, 'Legacy', 'Imported row', 'college', 'not-a-uuid', 'archived',
                'someday', '2024-03-01', '2024-03-01T10:00:00Z')
        "#
    )
    .bind(id.to_string())
    .execute(&pool)
    .await?;

    let legacy = repo.find_by_id(id).await?.expect("row is readable");
    assert_eq!(legacy.status, AnnouncementStatus::Draft);
    assert_eq!(legacy.expiry_date, None);
    assert_eq!(legacy.author_id, None);
    assert_eq!(legacy.scheduled_at, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
    assert_eq!(legacy.created_at, Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()));

    Ok(())
}

#[tokio::test]
async fn test_counters_and_top_announcements() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteAnnouncementRepository::new(pool.clone());
    let engagements = SqliteEngagementRepository::new(pool.clone());
    let now = Utc::now();

    let popular = repo.create(common::announcement("Popular", None, now)).await?;
    let quiet = repo.create(common::announcement("Quiet", None, now)).await?;

    for _ in 0..3 {
        repo.increment_views(popular.id).await?;
    }
    repo.increment_views(quiet.id).await?;
    repo.increment_clicks(popular.id).await?;
    repo.mark_email_sent(quiet.id).await?;

    engagements
        .record(Engagement {
            id: Uuid::new_v4(),
            announcement_id: popular.id,
            user_id: None,
            kind: EngagementKind::Click,
            created_at: now,
        })
        .await?;

    assert_eq!(repo.count().await?, 2);
    assert_eq!(repo.total_views().await?, 4);
    assert_eq!(engagements.count_for(popular.id, EngagementKind::Click).await?, 1);
    assert_eq!(engagements.count_for(popular.id, EngagementKind::View).await?, 0);

    let top = repo.top_by_views(1).await?;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, popular.id);
    assert_eq!(top[0].views, 3);

    let popular = repo.find_by_id(popular.id).await?.expect("exists");
    assert_eq!(popular.clicks_count, 1);
    assert!(repo.find_by_id(quiet.id).await?.expect("exists").email_sent);

    Ok(())
}
