use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub seed_demo_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// How long a unit of work waits for a seat/booking lock
    pub lock_timeout_ms: u64,
    #[serde(default = "default_pnr_attempts")]
    pub pnr_attempts: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_pnr_attempts() -> u32 {
    5
}

fn default_currency() -> String {
    "INR".to_string()
}

impl BookingRules {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `RAIL_STORAGE__BACKEND=postgres` sets `storage.backend`
            .add_source(config::Environment::with_prefix("RAIL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const DEFAULTS: &str = include_str!("../../config/default.toml");

    fn parse(extra: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(extra, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_file_parses() {
        let config = parse("");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed_demo_data);
        assert_eq!(config.booking.currency, "INR");
        assert_eq!(config.booking.lock_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_overrides_layer_on_top() {
        let config = parse(
            r#"
            [storage]
            backend = "postgres"

            [booking]
            lock_timeout_ms = 250
            "#,
        );
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.booking.lock_timeout_ms, 250);
        assert_eq!(config.booking.pnr_attempts, 5);
        assert_eq!(config.database.max_connections, 5);
    }
}
