use campus_board::{
    domain::{Announcement, AnnouncementStatus, Role, User},
    repository::{
        AnnouncementRepository, SqliteAnnouncementRepository,
        UserRepository, SqliteUserRepository,
    },
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{
        internet::en::Username,
        lorem::en::{Paragraph, Sentence},
    },
    Fake,
};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "seed")]
#[command(author, version, about = "Populate a campus board database with sample data")]
struct Args {
    /// Database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://campus-board.db?mode=rwc")]
    database_url: String,

    /// Email domain for generated users
    #[arg(long, default_value = "campus.edu")]
    domain: String,

    /// Extra regular announcements on top of the fixed scenarios
    #[arg(long, default_value_t = 10)]
    extra: usize,
}

fn user(email: String, role: &str) -> User {
    User {
        id: Uuid::new_v4(),
        external_id: None,
        email,
        username: Some(Username().fake()),
        role_raw: Some(role.to_string()),
        legacy_is_admin: false,
        created_at: None,
        last_login: Some(Utc::now()),
    }
}

fn announcement(author: &User, category: &str) -> Announcement {
    let now = Utc::now();
    Announcement {
        id: Uuid::new_v4(),
        title: Sentence(3..7).fake::<String>().trim_end_matches('.').to_string(),
        description: Paragraph(1..3).fake(),
        category: category.to_string(),
        author_id: Some(author.id),
        status: AnnouncementStatus::Active,
        is_active: true,
        is_emergency: false,
        expiry_date: Some(now + Duration::days(14)),
        scheduled_at: None,
        priority_until: None,
        emergency_expires_at: None,
        views_count: (0..250).fake(),
        clicks_count: (0..40).fake(),
        send_email: false,
        email_sent: false,
        link: None,
        short_code: None,
        created_at: Some(now - Duration::hours((1..96).fake())),
        updated_at: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let announcement_repo = SqliteAnnouncementRepository::new(db_pool.clone());

    println!("👥 Creating users...");
    let super_admin = user_repo.create(user(format!("dean@{}", args.domain), "super_admin")).await?;
    let admin = user_repo.create(user(format!("office@{}", args.domain), "admin")).await?;
    let student_admin = user_repo.create(user(format!("council@{}", args.domain), "student_admin")).await?;
    // Legacy spellings, to exercise role normalisation.
    user_repo.create(user(format!("legacy.super@{}", args.domain), "superadmin")).await?;
    let mut legacy_admin = user(format!("legacy.admin@{}", args.domain), "");
    legacy_admin.role_raw = None;
    legacy_admin.legacy_is_admin = true;
    user_repo.create(legacy_admin).await?;
    for i in 1..=5 {
        user_repo.create(user(format!("student{}@{}", i, args.domain), "user")).await?;
    }
    println!("  ✅ Created 10 users across every role");

    println!("📢 Creating announcements...");
    let now = Utc::now();

    let mut emergency = announcement(&super_admin, "emergency");
    emergency.title = "Campus-wide power outage".to_string();
    emergency.is_emergency = true;
    emergency.emergency_expires_at = Some(now + Duration::hours(6));
    announcement_repo.create(emergency).await?;

    let mut pinned = announcement(&admin, "academic");
    pinned.title = "Exam timetable published".to_string();
    pinned.status = AnnouncementStatus::Urgent;
    pinned.priority_until = Some(now + Duration::days(2));
    announcement_repo.create(pinned).await?;

    let mut scheduled = announcement(&student_admin, "tech-events");
    scheduled.title = "Hackathon registrations open".to_string();
    scheduled.status = AnnouncementStatus::Scheduled;
    scheduled.is_active = false;
    scheduled.scheduled_at = Some(now + Duration::days(3));
    scheduled.link = Some("https://example.com/hackathon".to_string());
    announcement_repo.create(scheduled).await?;

    let mut expired = announcement(&admin, "sports");
    expired.title = "Inter-hostel football finals".to_string();
    expired.expiry_date = Some(now - Duration::days(1));
    announcement_repo.create(expired).await?;

    let mut draft = announcement(&student_admin, "college");
    draft.title = "Library renovation plans".to_string();
    draft.status = AnnouncementStatus::Draft;
    announcement_repo.create(draft).await?;

    let mut in_review = announcement(&student_admin, "tech-workshops");
    in_review.status = AnnouncementStatus::UnderReview;
    announcement_repo.create(in_review).await?;

    let categories = ["college", "tech", "tech-events", "tech-workshops", "academic", "sports", "other"];
    let authors = [&super_admin, &admin, &student_admin];
    for i in 0..args.extra {
        let item = announcement(authors[i % authors.len()], categories[i % categories.len()]);
        announcement_repo.create(item).await?;
    }
    println!("  ✅ Created {} announcements", 6 + args.extra);

    println!("\n✨ Database seeding complete!");
    println!("\n📝 Seeded accounts (sign in through the identity provider with these emails):");
    for (role, account) in [
        (Role::SuperAdmin, &super_admin),
        (Role::Admin, &admin),
        (Role::StudentAdmin, &student_admin),
    ] {
        println!("  {}: {}", role.display_name(), account.email);
    }
    println!("  Students: student1..5@{}", args.domain);

    Ok(())
}
