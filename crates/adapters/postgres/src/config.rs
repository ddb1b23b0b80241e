//! PostgreSQL configuration
//!
//! Builds driver connect options from the individual locator components, so
//! passwords never need URL escaping.

use std::time::Duration;

use cobro_config::{DatabaseConfig, IdStrategy};
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgConnectOptions;

/// PostgreSQL configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Host
    pub host: String,
    /// Port
    pub port: u16,
    /// Database (service) name
    pub database: String,
    /// User name
    pub username: String,
    /// Password
    pub password: Option<Secret<String>>,
    /// Application name reported to the server
    pub application_name: Option<String>,

    /// Pool size; `None` opens one connection per request
    pub pool_max: Option<u32>,
    /// Time to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Primary key strategy for payment inserts
    pub id_strategy: IdStrategy,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: None,
            application_name: None,
            pool_max: None,
            acquire_timeout: Duration::from_secs(30),
            id_strategy: IdStrategy::default(),
        }
    }
}

impl PostgresConfig {
    /// Create from components
    pub fn from_components(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// Set password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Secret::new(password.into()));
        self
    }

    /// Set application name
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Use a bounded pool instead of one connection per request
    pub fn with_pool(mut self, max: u32) -> Self {
        self.pool_max = Some(max);
        self
    }

    /// Set primary key strategy
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Locator without credentials, for logs
    pub fn locator(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }

    /// Driver connect options
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username);

        if let Some(ref password) = self.password {
            options = options.password(password.expose_secret());
        }
        if let Some(ref app_name) = self.application_name {
            options = options.application_name(app_name);
        }

        options
    }
}

impl From<&DatabaseConfig> for PostgresConfig {
    fn from(config: &DatabaseConfig) -> Self {
        let mut pg = Self::from_components(
            config.host.clone(),
            config.port,
            config.service_name.clone(),
            config.user.clone(),
        )
        .with_id_strategy(config.id_strategy.clone());

        let password = config.password.expose_secret();
        if !password.is_empty() {
            pg = pg.with_password(password.clone());
        }
        if let Some(max) = config.pool_max_connections {
            pg = pg.with_pool(max);
        }

        pg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PostgresConfig::default();
        assert_eq!(config.port, 5432);
        assert!(config.pool_max.is_none());
        assert_eq!(config.id_strategy, IdStrategy::Database);
    }

    #[test]
    fn test_config_from_components() {
        let config = PostgresConfig::from_components("db.example.com", 5433, "atriod", "cobro")
            .with_password("secret")
            .with_application_name("cobro-api")
            .with_pool(8);

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 5433);
        assert_eq!(config.database, "atriod");
        assert_eq!(config.username, "cobro");
        assert_eq!(
            config.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("secret")
        );
        assert_eq!(config.application_name.as_deref(), Some("cobro-api"));
        assert_eq!(config.pool_max, Some(8));
    }

    #[test]
    fn test_connect_options() {
        let options = PostgresConfig::from_components("10.0.0.9", 6432, "atriod", "cobro")
            .with_password("p@ss/word")
            .connect_options();

        assert_eq!(options.get_host(), "10.0.0.9");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_database(), Some("atriod"));
        assert_eq!(options.get_username(), "cobro");
    }

    #[test]
    fn test_from_database_config() {
        let db = DatabaseConfig {
            user: "cobranza".to_string(),
            password: Secret::new(String::new()),
            host: "10.212.135.10".to_string(),
            port: 5432,
            service_name: "ATRIOD".to_string(),
            pool_max_connections: Some(4),
            id_strategy: IdStrategy::Sequence("acsel.banesco_seq".to_string()),
        };

        let config = PostgresConfig::from(&db);
        assert_eq!(config.locator(), "cobranza@10.212.135.10:5432/ATRIOD");
        assert!(config.password.is_none());
        assert_eq!(config.pool_max, Some(4));
        assert_eq!(
            config.id_strategy,
            IdStrategy::Sequence("acsel.banesco_seq".to_string())
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let config = PostgresConfig::default().with_password("hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
