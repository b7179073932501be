//! Service configuration loading and validation

use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_true() -> bool { true }
fn default_timeout_ms() -> u64 { 5_000 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_backend() -> StoreBackend { StoreBackend::Memory }
fn default_max_connections() -> u32 { 10 }
fn default_log_filter() -> String { "info".to_string() }

impl Default for ResolverSection {
    fn default() -> Self {
        Self { timeout_ms: default_timeout_ms() }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { log_filter: default_log_filter() }
    }
}

impl AccessConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| AccessError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognised: `ACCESS_HOST`, `ACCESS_PORT`, `ACCESS_RESOLVE_TIMEOUT_MS`,
    /// `ACCESS_STORE_BACKEND`, `DATABASE_URL`, `RUST_LOG`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ACCESS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ACCESS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AccessError::Config(format!("ACCESS_PORT is not a port: {}", port)))?;
        }
        if let Some(timeout) = lookup("ACCESS_RESOLVE_TIMEOUT_MS") {
            self.resolver.timeout_ms = timeout.parse().map_err(|_| {
                AccessError::Config(format!("ACCESS_RESOLVE_TIMEOUT_MS is not a number: {}", timeout))
            })?;
        }
        if let Some(backend) = lookup("ACCESS_STORE_BACKEND") {
            self.store.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" => StoreBackend::Postgres,
                other => {
                    return Err(AccessError::Config(format!("Unknown store backend: {}", other)))
                }
            };
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.store.database_url = Some(url);
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.logging.log_filter = filter;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.resolver.timeout_ms == 0 {
            return Err(AccessError::Config("resolver.timeout_ms must be positive".to_string()));
        }

        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            return Err(AccessError::Config(
                "store.database_url is required for the postgres backend".to_string(),
            ));
        }

        if self.store.max_connections == 0 {
            return Err(AccessError::Config("store.max_connections must be positive".to_string()));
        }

        Ok(())
    }

    /// Resolution deadline
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver.timeout_ms)
    }

    /// Listen address as "host:port"
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AccessConfig::default();
        assert_eq!(config.resolver.timeout_ms, 5_000);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[resolver]
timeout_ms = 250

[store]
backend = "postgres"
database_url = "postgresql://localhost/shop"
"#
        )
        .unwrap();

        let config = AccessConfig::load(file.path()).unwrap();
        assert_eq!(config.resolve_timeout(), Duration::from_millis(250));
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let err = AccessConfig::from_toml("[store]\nbackend = \"redis\"\n").unwrap_err();
        assert!(matches!(err, AccessError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ACCESS_PORT", "9000"),
            ("ACCESS_RESOLVE_TIMEOUT_MS", "1500"),
            ("ACCESS_STORE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgresql://db/shop"),
        ]
        .into_iter()
        .collect();

        let mut config = AccessConfig::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
        assert_eq!(config.resolver.timeout_ms, 1500);
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.database_url.as_deref(), Some("postgresql://db/shop"));
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = AccessConfig::default();
        let err = config
            .apply_env(|k| (k == "ACCESS_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, AccessError::Config(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = AccessConfig::default();
        config.resolver.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AccessConfig::default();
        config.store.backend = StoreBackend::Postgres;
        assert!(config.validate().is_err());
    }
}
