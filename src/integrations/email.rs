use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::EmailConfig,
    domain::Announcement,
    error::{AppError, Result},
    integrations::{BaseIntegration, Integration, Mailer},
};

#[derive(Template)]
#[template(path = "email/announcement.html")]
struct AnnouncementEmail<'a> {
    title: &'a str,
    description: &'a str,
    category: &'a str,
    is_emergency: bool,
    expiry: Option<String>,
    scheduled: Option<String>,
    link: Option<&'a str>,
    dashboard_url: &'a str,
}

pub fn subject_for(announcement: &Announcement) -> String {
    if announcement.is_emergency {
        format!("Emergency alert: {}", announcement.title)
    } else {
        format!("New announcement: {}", announcement.title)
    }
}

fn format_when(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|dt| dt.format("%B %-d, %Y %H:%M UTC").to_string())
}

pub fn render_body(announcement: &Announcement, dashboard_url: &str) -> Result<String> {
    AnnouncementEmail {
        title: &announcement.title,
        description: &announcement.description,
        category: &announcement.category,
        is_emergency: announcement.is_emergency,
        expiry: format_when(announcement.expiry_date),
        scheduled: format_when(announcement.scheduled_at),
        link: announcement.link.as_deref(),
        dashboard_url,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("Failed to render email: {}", e)))
}

pub struct SmtpMailer {
    base: BaseIntegration,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    dashboard_url: String,
}

impl SmtpMailer {
    pub fn new(config: Option<EmailConfig>, dashboard_url: &str) -> Result<Option<Self>> {
        let Some(cfg) = config.filter(|cfg| cfg.enabled) else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .map_err(|e| AppError::Integration(format!("Invalid SMTP relay: {}", e)))?
            .port(cfg.smtp_port);

        if let (Some(username), Some(password)) = (cfg.smtp_username.clone(), cfg.smtp_password.clone()) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let from = cfg
            .from_address
            .parse::<Mailbox>()
            .map_err(|_| AppError::Integration(format!("Invalid from address: {}", cfg.from_address)))?;

        let mut recipients = Vec::with_capacity(cfg.recipients.len());
        for address in &cfg.recipients {
            match address.parse::<Mailbox>() {
                Ok(mailbox) => recipients.push(mailbox),
                Err(_) => tracing::warn!("Skipping invalid recipient address: {}", address),
            }
        }

        Ok(Some(Self {
            base: BaseIntegration::new("SMTP mailer", cfg.enabled),
            transport: builder.build(),
            from,
            recipients,
            dashboard_url: dashboard_url.to_string(),
        }))
    }
}

#[async_trait]
impl Integration for SmtpMailer {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    async fn health_check(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Integration("SMTP server refused the connection".to_string())),
            Err(e) => Err(AppError::Integration(format!("SMTP connection failed: {}", e))),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_announcement(&self, announcement: &Announcement) -> Result<usize> {
        if self.recipients.is_empty() {
            return Err(AppError::ServiceUnavailable("No email recipients configured".to_string()));
        }

        let html = render_body(announcement, &self.dashboard_url)?;

        // Recipients go in Bcc.
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.from.clone())
            .subject(subject_for(announcement));
        for recipient in &self.recipients {
            builder = builder.bcc(recipient.clone());
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Integration(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            announcement_id = %announcement.id,
            recipients = self.recipients.len(),
            "Announcement email sent"
        );
        Ok(self.recipients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnnouncementStatus;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn announcement(is_emergency: bool) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            title: "Gas leak in Block C".to_string(),
            description: "Evacuate <now>".to_string(),
            category: "emergency".to_string(),
            author_id: None,
            status: AnnouncementStatus::Active,
            is_active: true,
            is_emergency,
            expiry_date: Some(Utc.with_ymd_and_hms(2025, 5, 2, 18, 0, 0).unwrap()),
            scheduled_at: None,
            priority_until: None,
            emergency_expires_at: None,
            views_count: 0,
            clicks_count: 0,
            send_email: true,
            email_sent: false,
            link: None,
            short_code: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_subject_prefix() {
        assert_eq!(subject_for(&announcement(true)), "Emergency alert: Gas leak in Block C");
        assert_eq!(subject_for(&announcement(false)), "New announcement: Gas leak in Block C");
    }

    #[test]
    fn test_body_escapes_and_links_dashboard() {
        let html = render_body(&announcement(true), "https://board.campus.edu").unwrap();
        assert!(html.contains("Gas leak in Block C"));
        assert!(html.contains("Evacuate &lt;now&gt;"));
        assert!(html.contains("board.campus.edu"));
        assert!(html.contains("May 2, 2025 18:00 UTC"));
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        assert!(SmtpMailer::new(None, "http://localhost").unwrap().is_none());
    }
}
