use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::domain::Announcement;
use crate::error::Result;

pub mod email;
pub mod shortener;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use email::SmtpMailer;
pub use shortener::SpooShortener;

#[async_trait]
pub trait Integration: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn health_check(&self) -> Result<()>;
}

/// Delivers announcement notifications.
#[async_trait]
pub trait Mailer: Integration {
    /// Returns the number of recipients the message was addressed to.
    async fn send_announcement(&self, announcement: &Announcement) -> Result<usize>;
}

/// Shortens outbound announcement links and reports their click counts.
#[async_trait]
pub trait LinkShortener: Integration {
    async fn shorten(&self, url: &str) -> Result<String>;
    async fn total_clicks(&self, short_code: &str) -> Result<i64>;
    fn short_url(&self, short_code: &str) -> String;
}

pub struct IntegrationManager {
    integrations: RwLock<Vec<Arc<dyn Integration>>>,
}

impl IntegrationManager {
    pub fn new() -> Self {
        Self {
            integrations: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, integration: Arc<dyn Integration>) {
        if integration.is_enabled() {
            tracing::info!("Registered integration: {}", integration.name());
            self.integrations.write().await.push(integration);
        }
    }

    pub async fn names(&self) -> Vec<String> {
        self.integrations
            .read()
            .await
            .iter()
            .map(|integration| integration.name().to_string())
            .collect()
    }

    pub async fn health_check_all(&self) -> Vec<(String, Result<()>)> {
        let integrations = self.integrations.read().await;
        let mut results = Vec::new();

        for integration in integrations.iter() {
            let name = integration.name().to_string();
            let result = integration.health_check().await;
            results.push((name, result));
        }

        results
    }
}

impl Default for IntegrationManager {
    fn default() -> Self {
        Self::new()
    }
}

// Base implementation for common integration functionality
pub struct BaseIntegration {
    pub name: String,
    pub enabled: bool,
}

impl BaseIntegration {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::testing::{FakeShortener, RecordingMailer};

    #[tokio::test]
    async fn test_manager_skips_disabled_integrations() {
        let manager = IntegrationManager::new();
        manager.register(Arc::new(RecordingMailer::new(vec!["a@campus.edu".to_string()]))).await;
        manager.register(Arc::new(FakeShortener::disabled())).await;

        assert_eq!(manager.names().await, vec!["Recording mailer".to_string()]);

        let results = manager.health_check_all().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_ok());
    }
}
