pub mod root;
pub mod announcements;
pub mod profile;
pub mod analytics;
pub mod admin;
