use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::ShortenerConfig,
    error::{AppError, Result},
    integrations::{BaseIntegration, Integration, LinkShortener},
};

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    alias: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    summary: Option<StatsSummary>,
}

#[derive(Debug, Deserialize)]
struct StatsSummary {
    total_clicks: Option<i64>,
}

/// Client for a spoo.me-compatible URL shortener.
pub struct SpooShortener {
    base: BaseIntegration,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SpooShortener {
    pub fn new(config: Option<ShortenerConfig>) -> Option<Self> {
        config.and_then(|cfg| {
            if cfg.enabled {
                Some(Self {
                    base: BaseIntegration::new("Link shortener", cfg.enabled),
                    client: reqwest::Client::new(),
                    base_url: cfg.base_url.trim_end_matches('/').to_string(),
                    api_key: cfg.api_key,
                })
            } else {
                None
            }
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl Integration for SpooShortener {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| AppError::Integration(format!("Shortener unreachable: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl LinkShortener for SpooShortener {
    async fn shorten(&self, url: &str) -> Result<String> {
        let response = self
            .authorized(self.client.post(format!("{}/api/v1/shorten", self.base_url)))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Shortener request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "Shortener returned {}",
                response.status()
            )));
        }

        let body: ShortenResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Invalid shortener response: {}", e)))?;

        match body.alias {
            Some(alias) if !alias.is_empty() => Ok(alias),
            _ => Err(AppError::External(
                body.error.unwrap_or_else(|| "Shortener returned no alias".to_string()),
            )),
        }
    }

    async fn total_clicks(&self, short_code: &str) -> Result<i64> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/v1/stats", self.base_url),
            &[("scope", "anon"), ("short_code", short_code)],
        )
        .map_err(|e| AppError::Integration(format!("Invalid shortener URL: {}", e)))?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Shortener stats request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "Shortener stats returned {}",
                response.status()
            )));
        }

        let body: StatsResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Invalid shortener stats response: {}", e)))?;

        body.summary
            .and_then(|summary| summary.total_clicks)
            .ok_or_else(|| AppError::External("Shortener stats are currently unavailable".to_string()))
    }

    fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let shortener = SpooShortener::new(Some(ShortenerConfig {
            enabled: true,
            base_url: "https://spoo.me/".to_string(),
            api_key: None,
        }))
        .unwrap();
        assert_eq!(shortener.short_url("abc123"), "https://spoo.me/abc123");
    }

    #[test]
    fn test_disabled_shortener_is_not_built() {
        let shortener = SpooShortener::new(Some(ShortenerConfig {
            enabled: false,
            base_url: "https://spoo.me".to_string(),
            api_key: None,
        }));
        assert!(shortener.is_none());
    }

    #[test]
    fn test_stats_response_shape() {
        let body: StatsResponse =
            serde_json::from_str(r#"{"summary": {"total_clicks": 42, "unique_clicks": 7}}"#).unwrap();
        assert_eq!(body.summary.and_then(|s| s.total_clicks), Some(42));
    }
}
