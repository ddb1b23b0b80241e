//! cobro-config - configuration loading
//!
//! Layering (later wins):
//! 1. `{config_dir}/default.toml`
//! 2. `{config_dir}/{APP_ENV}.toml`
//! 3. `APP_*` environment variables, `__` separates nested keys
//! 4. `DB_*` environment variables, mapped onto the `database` section

use std::collections::BTreeMap;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// How the payment transaction table gets its primary key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// The column is left out of the insert; a default, identity or trigger fills it
    #[default]
    Database,
    /// The insert supplies `nextval('<sequence>')` explicitly
    Sequence(String),
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default = "default_db_password")]
    pub password: Secret<String>,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_service_name")]
    pub service_name: String,
    /// Unset means one fresh connection per request
    #[serde(default)]
    pub pool_max_connections: Option<u32>,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

fn default_db_user() -> String {
    "cobro".to_string()
}

fn default_db_password() -> Secret<String> {
    Secret::new(String::new())
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_service_name() -> String {
    "atriod".to_string()
}

/// `DB_*` variables taken verbatim; `0071` must stay `0071`
const DB_TEXT_VARS: [(&str, &str); 4] = [
    ("DB_USER", "user"),
    ("DB_PASSWORD", "password"),
    ("DB_HOST", "host"),
    ("DB_SERVICE_NAME", "service_name"),
];

/// `DB_*` variables that are numbers
const DB_NUMERIC_KEYS: [&str; 2] = ["port", "pool_max_connections"];

fn db_text_env() -> BTreeMap<&'static str, String> {
    DB_TEXT_VARS
        .iter()
        .filter_map(|(var, key)| std::env::var(var).ok().map(|value| (*key, value)))
        .collect()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: default_db_user(),
            password: default_db_password(),
            host: default_db_host(),
            port: default_db_port(),
            service_name: default_db_service_name(),
            pool_max_connections: None,
            id_strategy: IdStrategy::default(),
        }
    }
}

impl DatabaseConfig {
    /// Connection locator without the password, safe to log
    pub fn locator(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.service_name
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let IdStrategy::Sequence(name) = &self.id_strategy {
            if !is_qualified_identifier(name) {
                return Err(ConfigError::Invalid(format!(
                    "database.id_strategy.sequence is not a valid sequence name: {:?}",
                    name
                )));
            }
        }
        if self.pool_max_connections == Some(0) {
            return Err(ConfigError::Invalid(
                "database.pool_max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `name` or `schema.name`, each part a plain SQL identifier
fn is_qualified_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Empty disables CORS handling
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            body_limit_bytes: default_body_limit_bytes(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_name() -> String {
    "cobro-api".to_string()
}

fn default_app_env() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = default_app_env();

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Serialized::default("database", db_text_env()))
            .merge(
                Env::prefixed("DB_")
                    .only(&DB_NUMERIC_KEYS)
                    .map(|key| format!("database.{}", key.as_str().to_ascii_lowercase()).into()),
            )
            .extract()?;

        config.database.validate()?;

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
