//! Configuration management for the Card Package Manager
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults: built-in defaults, then a TOML file, then
//! environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::app::ClientConfig;
use crate::constants::{catalog, env, files, http, limits, logging};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Token and data directory settings
    pub storage: StorageConfig,
    /// Debug mode, from `CPM_DEBUG` or `--debug`
    #[serde(skip)]
    pub debug: bool,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Catalog root used in normal operation
    pub url: String,
    /// Catalog root used in debug mode
    pub debug_url: String,
    /// Retries after the first attempt on connection failures
    pub retries: u32,
    /// Fixed delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Compare the local item schema with the server's on startup
    pub schema_check: bool,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            url: catalog::PRODUCTION_URL.to_string(),
            debug_url: catalog::DEBUG_URL.to_string(),
            retries: limits::MAX_RETRIES,
            retry_delay_ms: limits::RETRY_DELAY_MS,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            schema_check: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory, relative paths resolve under the data directory
    pub log_dir: PathBuf,
    /// Audit log file prefix
    pub audit_file: String,
    /// Error log file prefix
    pub error_file: String,
    /// Dump of the last failing response body
    pub debug_dump: String,
    /// Rotated files kept per channel
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(files::LOG_DIR),
            audit_file: files::AUDIT_LOG.to_string(),
            error_file: files::ERROR_LOG.to_string(),
            debug_dump: files::DEBUG_DUMP.to_string(),
            max_log_files: logging::MAX_LOG_FILES,
        }
    }
}

/// Token and data directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory (None = platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Auth token file, relative paths resolve under the data directory
    pub token_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            token_file: PathBuf::from(files::TOKEN_FILE),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI flags are applied by the caller afterwards.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path });
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::DEBUG) {
            self.debug = is_truthy(&value);
        }
        // Points both modes at the same server
        if let Some(url) = lookup(env::URL).filter(|u| !u.trim().is_empty()) {
            self.client.url = url.trim().to_string();
            self.client.debug_url = self.client.url.clone();
        }
        if let Some(dir) = lookup(env::DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.storage.data_dir = Some(PathBuf::from(dir.trim()));
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join(files::APP_DIR).join(files::CONFIG_FILE));
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content)?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Directory holding the token, logs and debug dumps
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(files::APP_DIR))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Resolve a configured path: absolute paths are kept, relative ones live
    /// under the data directory
    pub fn resolve(&self, path: &Path) -> ConfigResult<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.data_dir()?.join(path))
        }
    }

    /// Path of the persisted auth token
    pub fn token_path(&self) -> ConfigResult<PathBuf> {
        self.resolve(&self.storage.token_file)
    }

    /// Directory of the rolling log files
    pub fn log_dir(&self) -> ConfigResult<PathBuf> {
        self.resolve(&self.logging.log_dir)
    }

    /// Path of the failing-response dump
    pub fn debug_dump_path(&self) -> ConfigResult<PathBuf> {
        Ok(self.log_dir()?.join(&self.logging.debug_dump))
    }

    /// Catalog root for the current mode, always ending in `/`
    pub fn catalog_url(&self) -> ConfigResult<Url> {
        let raw = if self.debug {
            &self.client.debug_url
        } else {
            &self.client.url
        };

        let normalized = if raw.ends_with('/') {
            raw.clone()
        } else {
            format!("{}/", raw)
        };

        let url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            field: "client.url".to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidValue {
                field: "client.url".to_string(),
                value: raw.clone(),
                reason: "Catalog URL must use http or https".to_string(),
            });
        }
        Ok(url)
    }

    /// Build the runtime client configuration around an auth token
    pub fn client_config(&self, token: Option<String>) -> ConfigResult<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.catalog_url()?,
            token,
            retries: self.client.retries,
            retry_delay: Duration::from_millis(self.client.retry_delay_ms),
            request_timeout: Duration::from_secs(self.client.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.client.connect_timeout_secs),
            schema_check: self.client.schema_check && !self.debug,
            debug_dump: Some(self.debug_dump_path()?),
        })
    }
}

/// Interpret a flag-like environment value
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert!(!config.debug);
        assert_eq!(config.client.retries, limits::MAX_RETRIES);
        assert_eq!(config.client.retry_delay_ms, 1000);
        assert_eq!(config.logging.audit_file, "client.audit");
        assert_eq!(config.storage.token_file, PathBuf::from("token.key"));
        assert_eq!(
            config.catalog_url().unwrap().as_str(),
            catalog::PRODUCTION_URL
        );
    }

    #[test]
    fn test_debug_mode_switches_url_and_schema_check() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[(env::DEBUG, "1")]));

        assert!(config.debug);
        assert_eq!(config.catalog_url().unwrap().as_str(), catalog::DEBUG_URL);

        config.storage.data_dir = Some(PathBuf::from("/tmp/cpm-test"));
        let client = config.client_config(None).unwrap();
        assert!(!client.schema_check);
    }

    #[test]
    fn test_falsy_debug_values() {
        for value in ["", "0", "false", "FALSE"] {
            let mut config = AppConfig::default();
            config.apply_overrides(lookup_from(&[(env::DEBUG, value)]));
            assert!(!config.debug, "{:?} should not enable debug", value);
        }
    }

    #[test]
    fn test_url_override_gets_trailing_slash() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[(env::URL, "http://127.0.0.1:8080/api")]));

        assert_eq!(
            config.catalog_url().unwrap().as_str(),
            "http://127.0.0.1:8080/api/"
        );
    }

    #[test]
    fn test_url_override_applies_in_debug_mode() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[
            (env::DEBUG, "true"),
            (env::URL, "http://127.0.0.1:9000/"),
        ]));

        assert!(config.debug);
        assert_eq!(
            config.catalog_url().unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = AppConfig::default();
        config.client.url = "ftp://example.com/".to_string();
        assert!(matches!(
            config.catalog_url(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_paths_resolve_under_data_dir() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[(env::DATA_DIR, "/srv/cpm")]));

        assert_eq!(
            config.token_path().unwrap(),
            PathBuf::from("/srv/cpm/token.key")
        );
        assert_eq!(config.log_dir().unwrap(), PathBuf::from("/srv/cpm/logs"));
        assert_eq!(
            config.debug_dump_path().unwrap(),
            PathBuf::from("/srv/cpm/logs/debug.html")
        );

        config.storage.token_file = PathBuf::from("/etc/cpm/token.key");
        assert_eq!(
            config.token_path().unwrap(),
            PathBuf::from("/etc/cpm/token.key")
        );
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cpm.toml");

        let test_config = r#"
[client]
retries = 5
retry_delay_ms = 10

[logging]
max_log_files = 4
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.client.retries, 5);
        assert_eq!(config.client.retry_delay_ms, 10);
        assert_eq!(config.logging.max_log_files, 4);
        // Unspecified values keep their defaults
        assert_eq!(config.client.url, catalog::PRODUCTION_URL);
        assert!(config.client.schema_check);
    }

    #[tokio::test]
    async fn test_config_loading_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cpm.toml");
        tokio::fs::write(&config_path, "[client\nretries = ")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }
}
