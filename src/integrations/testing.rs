//! In-process stand-ins for the mailer and link shortener.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    domain::Announcement,
    error::{AppError, Result},
    integrations::{BaseIntegration, Integration, LinkShortener, Mailer},
};

/// Records every announcement it is asked to send.
pub struct RecordingMailer {
    base: BaseIntegration,
    recipients: Vec<String>,
    sent: Mutex<Vec<Uuid>>,
}

impl RecordingMailer {
    pub fn new(recipients: Vec<String>) -> Self {
        Self {
            base: BaseIntegration::new("Recording mailer", true),
            recipients,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Uuid> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Integration for RecordingMailer {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_announcement(&self, announcement: &Announcement) -> Result<usize> {
        if self.recipients.is_empty() {
            return Err(AppError::ServiceUnavailable("No email recipients configured".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(announcement.id);
        }
        Ok(self.recipients.len())
    }
}

/// Hands out sequential aliases, or fails every call when `failing`.
pub struct FakeShortener {
    base: BaseIntegration,
    failing: bool,
    clicks: i64,
    issued: Mutex<Vec<String>>,
}

impl FakeShortener {
    pub fn new(clicks: i64) -> Self {
        Self {
            base: BaseIntegration::new("Fake shortener", true),
            failing: false,
            clicks,
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(0)
        }
    }

    pub fn disabled() -> Self {
        Self {
            base: BaseIntegration::new("Fake shortener", false),
            ..Self::new(0)
        }
    }

    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().map(|issued| issued.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Integration for FakeShortener {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl LinkShortener for FakeShortener {
    async fn shorten(&self, _url: &str) -> Result<String> {
        if self.failing {
            return Err(AppError::External("Shortener returned 503 Service Unavailable".to_string()));
        }
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| AppError::Internal("Shortener state poisoned".to_string()))?;
        let alias = format!("s{}", issued.len() + 1);
        issued.push(alias.clone());
        Ok(alias)
    }

    async fn total_clicks(&self, _short_code: &str) -> Result<i64> {
        if self.failing {
            return Err(AppError::External("Shortener stats are currently unavailable".to_string()));
        }
        Ok(self.clicks)
    }

    fn short_url(&self, short_code: &str) -> String {
        format!("https://short.test/{}", short_code)
    }
}
