//! Configuration management.
//!
//! A config file (TOML, YAML or JSON, discovered with `prefer`) supplies
//! optional overrides; `Settings` holds the resolved values the server and
//! CLI run with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_client::{FetchLimits, USER_AGENT};
use crate::rate_limit::RateLimitConfig;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "centscape.db";

const APP_DIR: &str = "centscape";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Address the HTTP server listens on.
    pub bind: String,
    /// SQLite database backing the wishlist.
    pub database_path: PathBuf,
    /// User agent for preview fetches.
    pub user_agent: String,
    pub fetch: FetchLimits,
    pub rate_limit: RateLimitConfig,
    /// Use the first `X-Forwarded-For` entry as the client identity.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            bind: DEFAULT_BIND.to_string(),
            database_path: data_dir.join(DEFAULT_DATABASE_FILENAME),
            user_agent: USER_AGENT.to_string(),
            fetch: FetchLimits::default(),
            rate_limit: RateLimitConfig::default(),
            trust_forwarded_for: false,
        }
    }
}

impl Settings {
    /// Apply `CENTSCAPE_*` and `PORT` environment variables.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get("CENTSCAPE_BIND") {
            tracing::debug!("Using CENTSCAPE_BIND from environment: {}", bind);
            self.bind = bind;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.bind = with_port(&self.bind, port),
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(database) = get("CENTSCAPE_DATABASE") {
            self.database_path = PathBuf::from(shellexpand::tilde(&database).as_ref());
        }
        if let Some(user_agent) = get("CENTSCAPE_USER_AGENT") {
            self.user_agent = user_agent;
        }
    }

    pub fn fetch_limits(&self) -> FetchLimits {
        self.fetch
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        self.rate_limit
    }

    /// Ensure the database directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Replace the port of a `host:port` address.
fn with_port(bind: &str, port: u16) -> String {
    let host = bind.rsplit_once(':').map(|(host, _)| host).unwrap_or(bind);
    format!("{}:{}", host, port)
}

/// Fetch limits section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

/// Rate limit section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitFileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Listen address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Database path, relative to the config file unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_forwarded_for: Option<bool>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub rate_limit: RateLimitFileConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery, or defaults when no
    /// `centscape` config file exists in the standard locations.
    ///
    /// An explicitly requested file must exist and parse.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::load_from_path(path).await;
        }

        // Use prefer for file discovery, then parse with serde
        match prefer::load(APP_DIR).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref database) = self.database {
            settings.database_path = self.resolve_path(database, base_dir);
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(trust) = self.trust_forwarded_for {
            settings.trust_forwarded_for = trust;
        }
        if let Some(timeout_ms) = self.fetch.timeout_ms {
            settings.fetch.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(max_redirects) = self.fetch.max_redirects {
            settings.fetch.max_redirects = max_redirects;
        }
        if let Some(max_bytes) = self.fetch.max_bytes {
            settings.fetch.max_bytes = max_bytes;
        }
        if let Some(max_requests) = self.rate_limit.max_requests {
            settings.rate_limit.max_requests = max_requests;
        }
        if let Some(window_secs) = self.rate_limit.window_secs {
            settings.rate_limit.window = Duration::from_secs(window_secs);
        }
    }
}

/// Load config, apply it over defaults, then apply environment overrides.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), String> {
    let config = Config::load(config_path).await?;
    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    Ok((settings.with_env_overrides(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind, "0.0.0.0:3000");
        assert_eq!(settings.user_agent, "CentscapeBot/1.0");
        assert_eq!(settings.fetch.timeout, Duration::from_millis(5000));
        assert_eq!(settings.fetch.max_redirects, 3);
        assert_eq!(settings.fetch.max_bytes, 524_288);
        assert_eq!(settings.rate_limit.max_requests, 10);
        assert_eq!(settings.rate_limit.window, Duration::from_secs(60));
        assert!(!settings.trust_forwarded_for);
        assert!(settings.database_path.ends_with("centscape/centscape.db"));
    }

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("0.0.0.0:3000", 8080), "0.0.0.0:8080");
        assert_eq!(with_port("[::]:3000", 4000), "[::]:4000");
        assert_eq!(with_port("localhost", 5000), "localhost:5000");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CENTSCAPE_BIND", "127.0.0.1:9000"),
            ("PORT", "8081"),
            ("CENTSCAPE_DATABASE", "/tmp/wishlist.db"),
            ("CENTSCAPE_USER_AGENT", "TestBot/2.0"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.bind, "127.0.0.1:8081");
        assert_eq!(settings.database_path, PathBuf::from("/tmp/wishlist.db"));
        assert_eq!(settings.user_agent, "TestBot/2.0");
    }

    #[test]
    fn test_invalid_port_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(settings.bind, DEFAULT_BIND);
    }

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centscape.toml");
        std::fs::write(
            &path,
            r#"
bind = "127.0.0.1:4000"
database = "data/wishlist.db"
trust_forwarded_for = true

[fetch]
timeout_ms = 2500
max_bytes = 1024

[rate_limit]
max_requests = 3
window_secs = 10
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.bind, "127.0.0.1:4000");
        assert_eq!(settings.database_path, dir.path().join("data/wishlist.db"));
        assert!(settings.trust_forwarded_for);
        assert_eq!(settings.fetch.timeout, Duration::from_millis(2500));
        assert_eq!(settings.fetch.max_redirects, 3);
        assert_eq!(settings.fetch.max_bytes, 1024);
        assert_eq!(settings.rate_limit.max_requests, 3);
        assert_eq!(settings.rate_limit.window, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "user_agent: YamlBot/1.0\nfetch:\n  max_redirects: 5\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("YamlBot/1.0"));
        assert_eq!(config.fetch.max_redirects, Some(5));

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"rate_limit": {"max_requests": 20}}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.rate_limit.max_requests, Some(20));
        assert_eq!(config.bind, None);
    }

    #[tokio::test]
    async fn test_explicit_yaml_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centscape.yaml");
        std::fs::write(&path, "bind: 127.0.0.1:7000\ndatabase: wishlist.db\n").unwrap();

        let config = Config::load(Some(&path)).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());
        assert_eq!(settings.bind, "127.0.0.1:7000");
        assert_eq!(settings.database_path, dir.path().join("wishlist.db"));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).await.unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[tokio::test]
    async fn test_invalid_toml_reports_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "bind = [").unwrap();
        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.starts_with("Failed to parse TOML config"));
    }
}
