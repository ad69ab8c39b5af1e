use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::Announcement;

/// Order announcements for display: emergencies first, then items inside an
/// active priority window, then newest first. Stable, so ties keep their
/// input order.
pub fn rank_by_priority(mut announcements: Vec<Announcement>, now: DateTime<Utc>) -> Vec<Announcement> {
    announcements.sort_by(|a, b| compare_priority(a, b, now));
    announcements
}

pub fn compare_priority(a: &Announcement, b: &Announcement, now: DateTime<Utc>) -> Ordering {
    // `true` must come first, hence b before a.
    b.is_emergency
        .cmp(&a.is_emergency)
        .then_with(|| {
            b.has_active_priority_window(now)
                .cmp(&a.has_active_priority_window(now))
        })
        .then_with(|| {
            // `None` orders before any `Some`, i.e. as the earliest instant.
            b.created_at.cmp(&a.created_at)
        })
}

/// `"all"` keeps everything; otherwise a case-insensitive exact match.
pub fn filter_by_category(announcements: Vec<Announcement>, category: &str) -> Vec<Announcement> {
    if category == "all" {
        return announcements;
    }
    let wanted = category.to_lowercase();
    announcements
        .into_iter()
        .filter(|a| a.category.to_lowercase() == wanted)
        .collect()
}

/// Case-insensitive substring match on title or description. A blank query
/// keeps everything.
pub fn search_by_text(announcements: Vec<Announcement>, query: &str) -> Vec<Announcement> {
    if query.trim().is_empty() {
        return announcements;
    }
    let needle = query.to_lowercase();
    announcements
        .into_iter()
        .filter(|a| {
            a.title.to_lowercase().contains(&needle)
                || a.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnnouncementStatus;
    use chrono::Duration;
    use uuid::Uuid;

    fn item(title: &str, created_at: Option<DateTime<Utc>>) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "x".to_string(),
            category: "college".to_string(),
            author_id: None,
            status: AnnouncementStatus::Active,
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
            created_at,
            updated_at: None,
        }
    }

    fn titles(list: &[Announcement]) -> Vec<&str> {
        list.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_emergency_always_first() {
        let now = Utc::now();
        let mut old_emergency = item("emergency", Some(now - Duration::days(30)));
        old_emergency.is_emergency = true;

        let mut pinned = item("pinned", Some(now));
        pinned.status = AnnouncementStatus::Urgent;
        pinned.priority_until = Some(now + Duration::days(1));

        let fresh = item("fresh", Some(now + Duration::minutes(1)));

        let ranked = rank_by_priority(vec![fresh, pinned, old_emergency], now);
        assert_eq!(titles(&ranked), vec!["emergency", "pinned", "fresh"]);
    }

    #[test]
    fn test_emergency_beats_priority_window_scenario() {
        let now = Utc::now();
        let t0 = now - Duration::hours(2);
        let t1 = now - Duration::hours(1);

        let mut first = item("1", Some(t0));
        first.status = AnnouncementStatus::Urgent;
        first.priority_until = Some(now + Duration::days(1));

        let mut second = item("2", Some(t1));
        second.is_emergency = true;

        let ranked = rank_by_priority(vec![first, second], now);
        assert_eq!(titles(&ranked), vec!["2", "1"]);
    }

    #[test]
    fn test_future_priority_without_urgent_status_is_not_pinned() {
        let now = Utc::now();
        let mut not_urgent = item("not-urgent", Some(now - Duration::days(2)));
        not_urgent.priority_until = Some(now + Duration::days(1));

        let newer = item("newer", Some(now - Duration::days(1)));

        let ranked = rank_by_priority(vec![not_urgent, newer], now);
        assert_eq!(titles(&ranked), vec!["newer", "not-urgent"]);
    }

    #[test]
    fn test_expired_priority_window_is_not_pinned() {
        let now = Utc::now();
        let mut lapsed = item("lapsed", Some(now - Duration::days(2)));
        lapsed.status = AnnouncementStatus::Urgent;
        lapsed.priority_until = Some(now - Duration::minutes(1));

        let newer = item("newer", Some(now - Duration::days(1)));

        let ranked = rank_by_priority(vec![lapsed, newer], now);
        assert_eq!(titles(&ranked), vec!["newer", "lapsed"]);
    }

    #[test]
    fn test_missing_created_at_sorts_last_and_ties_are_stable() {
        let now = Utc::now();
        let ranked = rank_by_priority(
            vec![
                item("undated", None),
                item("a", Some(now)),
                item("b", Some(now)),
                item("c", Some(now)),
                item("older", Some(now - Duration::days(1))),
            ],
            now,
        );
        assert_eq!(titles(&ranked), vec!["a", "b", "c", "older", "undated"]);
    }

    #[test]
    fn test_filter_by_category() {
        let mut tech = item("tech", None);
        tech.category = "Tech".to_string();
        let college = item("college", None);
        let list = vec![tech, college];

        let all = filter_by_category(list.clone(), "all");
        assert_eq!(titles(&all), titles(&list));

        let only_tech = filter_by_category(list, "TECH");
        assert_eq!(titles(&only_tech), vec!["tech"]);
    }

    #[test]
    fn test_search_by_text() {
        let drill = item("Fire Drill", None);
        let mut lab = item("Lab closure", None);
        lab.description = "The chemistry lab is closed for a FIRE inspection".to_string();
        let other = item("Sports day", None);
        let list = vec![drill, lab, other];

        assert_eq!(search_by_text(list.clone(), "").len(), 3);
        assert_eq!(search_by_text(list.clone(), "   ").len(), 3);
        assert_eq!(titles(&search_by_text(list.clone(), "fire")), vec!["Fire Drill", "Lab closure"]);
        assert!(search_by_text(list, "robotics").is_empty());
    }
}
