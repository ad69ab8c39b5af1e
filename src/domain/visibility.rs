use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Announcement, AnnouncementStatus, Role, User};

/// Who is looking at the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: Option<Uuid>,
    pub role: Role,
    /// Legacy `is_admin` flag as supplied by the identity layer. Already
    /// folded into `role` by normalisation; kept for callers that log it.
    pub is_admin_flag: bool,
    pub is_super_admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: Role::Student,
            is_admin_flag: false,
            is_super_admin: false,
        }
    }

    pub fn from_user(user: &User) -> Self {
        let role = user.role();
        Self {
            id: Some(user.id),
            role,
            is_admin_flag: user.legacy_is_admin,
            is_super_admin: role == Role::SuperAdmin,
        }
    }
}

/// Whether `viewer` may see `announcement` at `now`.
///
/// Admin-tier viewers see everything. Regular viewers never see scheduled
/// items (by status, by the `scheduled` category tag, or by a future
/// `scheduled_at`), nor drafts, items under review, rejected, inactive or
/// expired ones.
pub fn is_visible(announcement: &Announcement, viewer: &Viewer, now: DateTime<Utc>) -> bool {
    let has_admin_level = viewer.role.has_admin_access();

    if !has_admin_level && !viewer.is_super_admin {
        if announcement.status == AnnouncementStatus::Scheduled {
            return false;
        }
        if announcement.category.to_lowercase() == "scheduled" {
            return false;
        }
        if announcement.is_scheduled_for_future(now) {
            return false;
        }
    }

    if has_admin_level {
        return true;
    }

    match announcement.status {
        AnnouncementStatus::Draft
        | AnnouncementStatus::UnderReview
        | AnnouncementStatus::Rejected => return false,
        _ => {}
    }

    if !announcement.is_active {
        return false;
    }

    !announcement.is_expired(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn announcement(status: AnnouncementStatus) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            category: "college".to_string(),
            author_id: None,
            status,
            is_active: true,
            is_emergency: false,
            expiry_date: None,
            scheduled_at: None,
            priority_until: None,
            emergency_expires_at: None,
            views_count: 0,
            clicks_count: 0,
            send_email: false,
            email_sent: false,
            link: None,
            short_code: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn viewer(role: Role) -> Viewer {
        Viewer {
            id: Some(Uuid::new_v4()),
            role,
            is_admin_flag: false,
            is_super_admin: false,
        }
    }

    const ALL_STATUSES: [AnnouncementStatus; 8] = [
        AnnouncementStatus::Draft,
        AnnouncementStatus::UnderReview,
        AnnouncementStatus::Approved,
        AnnouncementStatus::Rejected,
        AnnouncementStatus::Scheduled,
        AnnouncementStatus::Active,
        AnnouncementStatus::Urgent,
        AnnouncementStatus::Expired,
    ];

    #[test]
    fn test_scheduled_status_never_visible_to_students() {
        let now = Utc::now();
        let student = viewer(Role::Student);

        for is_active in [true, false] {
            for is_emergency in [true, false] {
                for expiry in [None, Some(now + Duration::days(1)), Some(now - Duration::days(1))] {
                    for category in ["college", "emergency", "scheduled"] {
                        let mut a = announcement(AnnouncementStatus::Scheduled);
                        a.is_active = is_active;
                        a.is_emergency = is_emergency;
                        a.expiry_date = expiry;
                        a.category = category.to_string();
                        assert!(!is_visible(&a, &student, now));
                    }
                }
            }
        }
    }

    #[test]
    fn test_scheduled_category_is_case_insensitive() {
        let now = Utc::now();
        let mut a = announcement(AnnouncementStatus::Active);
        a.category = "Scheduled".to_string();
        assert!(!is_visible(&a, &viewer(Role::Student), now));

        a.category = "SCHEDULED".to_string();
        assert!(!is_visible(&a, &viewer(Role::Student), now));
    }

    #[test]
    fn test_future_scheduled_at_hides_from_students() {
        let now = Utc::now();
        let mut a = announcement(AnnouncementStatus::Active);
        a.scheduled_at = Some(now + Duration::hours(1));
        assert!(!is_visible(&a, &viewer(Role::Student), now));

        a.scheduled_at = Some(now - Duration::hours(1));
        assert!(is_visible(&a, &viewer(Role::Student), now));
    }

    #[test]
    fn test_admin_tier_sees_everything() {
        let now = Utc::now();
        for role in [Role::StudentAdmin, Role::Admin, Role::SuperAdmin] {
            let admin = viewer(role);
            for status in ALL_STATUSES {
                let mut a = announcement(status);
                a.is_active = false;
                a.category = "scheduled".to_string();
                a.expiry_date = Some(now - Duration::days(3));
                a.scheduled_at = Some(now + Duration::days(3));
                assert!(is_visible(&a, &admin, now), "{role} should see {status:?}");
            }
        }
    }

    #[test]
    fn test_students_do_not_see_unpublished_statuses() {
        let now = Utc::now();
        let student = viewer(Role::Student);
        for status in [
            AnnouncementStatus::Draft,
            AnnouncementStatus::UnderReview,
            AnnouncementStatus::Rejected,
        ] {
            assert!(!is_visible(&announcement(status), &student, now));
        }
        for status in [
            AnnouncementStatus::Approved,
            AnnouncementStatus::Active,
            AnnouncementStatus::Urgent,
            AnnouncementStatus::Expired,
        ] {
            assert!(is_visible(&announcement(status), &student, now));
        }
    }

    #[test]
    fn test_inactive_and_expired_hidden_from_students() {
        let now = Utc::now();
        let student = viewer(Role::Student);

        let mut inactive = announcement(AnnouncementStatus::Active);
        inactive.is_active = false;
        assert!(!is_visible(&inactive, &student, now));

        let mut expired = announcement(AnnouncementStatus::Active);
        expired.expiry_date = Some(now - Duration::days(1));
        assert!(!is_visible(&expired, &student, now));
    }

    #[test]
    fn test_super_admin_flag_skips_schedule_gate_only() {
        let now = Utc::now();
        let flagged = Viewer {
            id: None,
            role: Role::Student,
            is_admin_flag: false,
            is_super_admin: true,
        };

        let mut scheduled_tag = announcement(AnnouncementStatus::Active);
        scheduled_tag.category = "scheduled".to_string();
        assert!(is_visible(&scheduled_tag, &flagged, now));

        let draft = announcement(AnnouncementStatus::Draft);
        assert!(!is_visible(&draft, &flagged, now));
    }

    #[test]
    fn test_expiry_scenario_keeps_only_unexpired() {
        let now = Utc::now();
        let mut first = announcement(AnnouncementStatus::Active);
        first.expiry_date = Some(now - Duration::days(1));
        let second = announcement(AnnouncementStatus::Active);
        let second_id = second.id;

        let visible: Vec<_> = [first, second]
            .into_iter()
            .filter(|a| is_visible(a, &Viewer::anonymous(), now))
            .collect();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, second_id);
    }
}
