use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub announcements: AnnouncementConfig,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub shortener: Option<ShortenerConfig>,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// Dashboard URL linked from notification emails.
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 shared secret for identity tokens.
    pub token_secret: Option<String>,
    /// RS256 public key (PEM). Takes precedence over `token_secret`.
    pub token_public_key_pem: Option<String>,
    pub token_issuer: Option<String>,
    #[serde(default)]
    pub token_leeway_secs: u64,
    /// Empty means every email domain may sign in.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnouncementConfig {
    pub categories: Vec<String>,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            categories: [
                "college",
                "tech",
                "tech-events",
                "tech-workshops",
                "academic",
                "sports",
                "emergency",
                "scheduled",
                "other",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShortenerConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub general: LimitConfig,
    pub auth: LimitConfig,
    pub admin: LimitConfig,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            general: LimitConfig { max_requests: 100, window_secs: 15 * 60 },
            auth: LimitConfig { max_requests: 25, window_secs: 15 * 60 },
            admin: LimitConfig { max_requests: 200, window_secs: 15 * 60 },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("server.frontend_url", "http://localhost:3000")?
            .set_default("database.url", "sqlite://campus-board.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_leeway_secs", 30)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with CAMPUS_BOARD__ prefix, double underscore separates levels)
            .add_source(
                Environment::with_prefix("CAMPUS_BOARD")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_domains")
                    .with_list_parse_key("email.recipients")
                    .with_list_parse_key("announcements.categories")
                    .try_parsing(true),
            )

            .build()?;

        config.try_deserialize()
    }

    pub fn is_allowed_domain(&self, domain: Option<&str>) -> bool {
        if self.auth.allowed_domains.is_empty() {
            return true;
        }
        match domain {
            Some(domain) => self
                .auth
                .allowed_domains
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(domain)),
            None => false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
                frontend_url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://campus-board.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                token_secret: None,
                token_public_key_pem: None,
                token_issuer: None,
                token_leeway_secs: 30,
                allowed_domains: Vec::new(),
            },
            announcements: AnnouncementConfig::default(),
            email: None,
            shortener: None,
            rate_limit: RateLimitSettings::default(),
        }
    }
}
