use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;

use crate::{
    api::state::AppState,
    config::{LimitConfig, RateLimitSettings},
    error::{AppError, Result},
};

/// Entries beyond this trigger a sweep of expired windows.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitProfile {
    General,
    Auth,
    Admin,
}

impl RateLimitProfile {
    pub fn key_prefix(self) -> &'static str {
        match self {
            RateLimitProfile::General => "general",
            RateLimitProfile::Auth => "auth",
            RateLimitProfile::Admin => "admin",
        }
    }

    /// Which budget a request draws from. `None` for paths outside `/api`.
    pub fn for_request(method: &Method, path: &str) -> Option<Self> {
        if !(path == "/api" || path.starts_with("/api/")) {
            return None;
        }
        if path.starts_with("/api/admin")
            || path.starts_with("/api/analytics/stats")
            || path.starts_with("/api/analytics/link-stats")
        {
            return Some(RateLimitProfile::Admin);
        }
        if path.starts_with("/api/announcements") && *method != Method::GET {
            return Some(RateLimitProfile::Admin);
        }
        if path == "/api/profile" {
            return Some(RateLimitProfile::Auth);
        }
        Some(RateLimitProfile::General)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Fixed-window request counter keyed by `profile:client`.
pub struct RateLimiter {
    settings: RateLimitSettings,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn limits(&self, profile: RateLimitProfile) -> LimitConfig {
        match profile {
            RateLimitProfile::General => self.settings.general,
            RateLimitProfile::Auth => self.settings.auth,
            RateLimitProfile::Admin => self.settings.admin,
        }
    }

    /// Counts one request. On refusal returns the seconds until the window resets.
    pub async fn check(&self, profile: RateLimitProfile, client: &str, now: Instant) -> std::result::Result<(), u64> {
        let limits = self.limits(profile);
        let key = format!("{}:{}", profile.key_prefix(), client);
        let mut windows = self.windows.write().await;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, window| window.resets_at > now);
        }

        if let Some(window) = windows.get_mut(&key) {
            if window.resets_at > now {
                if window.count >= limits.max_requests {
                    let remaining = window.resets_at.saturating_duration_since(now);
                    return Err(remaining.as_secs().max(1));
                }
                window.count += 1;
                return Ok(());
            }
        }

        windows.insert(
            key,
            Window {
                count: 1,
                resets_at: now + Duration::from_secs(limits.window_secs),
            },
        );
        Ok(())
    }
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, else `unknown`.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let limiter = &state.rate_limiter;
    if limiter.is_enabled() {
        if let Some(profile) = RateLimitProfile::for_request(request.method(), request.uri().path()) {
            let client = client_ip(request.headers());
            if let Err(retry_after) = limiter.check(profile, &client, Instant::now()).await {
                tracing::warn!(client = %client, profile = profile.key_prefix(), "Rate limit exceeded");
                return Err(AppError::TooManyRequests { retry_after });
            }
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        let limit = LimitConfig { max_requests, window_secs };
        RateLimiter::new(RateLimitSettings {
            enabled: true,
            general: limit,
            auth: limit,
            admin: limit,
        })
    }

    #[tokio::test]
    async fn test_limit_then_reset() {
        let limiter = limiter(3, 60);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check(RateLimitProfile::General, "10.0.0.1", start).await.is_ok());
        }
        let retry = limiter
            .check(RateLimitProfile::General, "10.0.0.1", start + Duration::from_secs(15))
            .await
            .unwrap_err();
        assert_eq!(retry, 45);

        let later = start + Duration::from_secs(61);
        assert!(limiter.check(RateLimitProfile::General, "10.0.0.1", later).await.is_ok());
    }

    #[tokio::test]
    async fn test_profiles_and_clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.check(RateLimitProfile::General, "a", now).await.is_ok());
        assert!(limiter.check(RateLimitProfile::General, "a", now).await.is_err());
        assert!(limiter.check(RateLimitProfile::Admin, "a", now).await.is_ok());
        assert!(limiter.check(RateLimitProfile::General, "b", now).await.is_ok());
    }

    #[test]
    fn test_default_profiles() {
        let settings = RateLimitSettings::default();
        assert_eq!((settings.general.max_requests, settings.general.window_secs), (100, 900));
        assert_eq!((settings.auth.max_requests, settings.auth.window_secs), (25, 900));
        assert_eq!((settings.admin.max_requests, settings.admin.window_secs), (200, 900));
    }

    #[test]
    fn test_profile_selection() {
        assert_eq!(RateLimitProfile::for_request(&Method::GET, "/health"), None);
        assert_eq!(
            RateLimitProfile::for_request(&Method::GET, "/api/announcements"),
            Some(RateLimitProfile::General)
        );
        assert_eq!(
            RateLimitProfile::for_request(&Method::POST, "/api/announcements"),
            Some(RateLimitProfile::Admin)
        );
        assert_eq!(
            RateLimitProfile::for_request(&Method::GET, "/api/admin/users"),
            Some(RateLimitProfile::Admin)
        );
        assert_eq!(
            RateLimitProfile::for_request(&Method::GET, "/api/profile"),
            Some(RateLimitProfile::Auth)
        );
    }

    #[test]
    fn test_client_ip_resolution() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        assert_eq!(client_ip(&headers), "192.168.1.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.5 , 10.0.0.1"));
        assert_eq!(client_ip(&headers), "203.0.113.5");
    }
}
