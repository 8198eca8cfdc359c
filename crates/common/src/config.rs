//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix shared by every configuration key.
const ENV_PREFIX: &str = "TERAPIE";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Uploaded file storage.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Outgoing email.
    #[serde(default)]
    pub email: EmailSettings,
    /// Account and password policy.
    #[serde(default)]
    pub auth: AuthSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site, used to build links in emails.
    pub url: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Local file storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory uploaded files are written to.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// URL prefix the files are served under.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// Which transport delivers outgoing email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// Resend HTTP API.
    Resend,
    /// Plain SMTP relay.
    Smtp,
    /// Nothing is sent; messages are written to the log.
    #[default]
    Log,
}

/// Email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Active provider.
    #[serde(default)]
    pub provider: EmailProviderKind,
    /// API key for Resend.
    #[serde(default)]
    pub resend_api_key: Option<String>,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Inbox that receives contact form submissions.
    #[serde(default = "default_admin_address")]
    pub admin_address: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            provider: EmailProviderKind::default(),
            resend_api_key: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
            from_name: default_from_name(),
            admin_address: default_admin_address(),
        }
    }
}

/// Account policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Minimum accepted password length.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Length of generated temporary passwords.
    #[serde(default = "default_temp_password_length")]
    pub temp_password_length: usize,
    /// Lifetime of a password reset link, in minutes.
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            temp_password_length: default_temp_password_length(),
            reset_token_ttl_minutes: default_reset_token_ttl(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_body_limit() -> usize {
    12 * 1024 * 1024
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_storage_url() -> String {
    "/files".to_string()
}

const fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@terapie.ro".to_string()
}

fn default_from_name() -> String {
    "Terapie".to_string()
}

fn default_admin_address() -> String {
    "contact@terapie.ro".to_string()
}

const fn default_min_password_length() -> usize {
    8
}

const fn default_temp_password_length() -> usize {
    12
}

const fn default_reset_token_ttl() -> i64 {
    60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TERAPIE_ENV`)
    /// 3. Environment variables with `TERAPIE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TERAPIE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Public site URL without a trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        self.server.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize::<Config>())
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            url = "https://terapie.ro/"

            [database]
            url = "postgres://localhost/terapie"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.site_url(), "https://terapie.ro");
        assert_eq!(config.email.provider, EmailProviderKind::Log);
        assert_eq!(config.auth.temp_password_length, 12);
        assert_eq!(config.storage.base_url, "/files");
    }

    #[test]
    fn test_email_provider_parsing() {
        let config = parse(
            r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/terapie"

            [email]
            provider = "resend"
            resend_api_key = "re_test"
            admin_address = "office@example.com"
            "#,
        );

        assert_eq!(config.email.provider, EmailProviderKind::Resend);
        assert_eq!(config.email.resend_api_key.as_deref(), Some("re_test"));
        assert_eq!(config.email.admin_address, "office@example.com");
        assert_eq!(config.email.smtp_port, 587);
    }
}
