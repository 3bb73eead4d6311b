//! Configuration management for Stirling

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable App Service uses for custom connection strings
pub const CONNECTION_STRING_ENV: &str = "CUSTOMCONNSTR_AZURE_STORAGE_CONNECTION_STRING";
/// Plain fallback for the connection string
pub const CONNECTION_STRING_FALLBACK_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";
/// Listening port override
pub const PORT_ENV: &str = "PORT";

/// Main configuration structure for Stirling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Fix feed configuration
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML/YAML/JSON file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        Self::parse(&content, extension)
    }

    /// Parse configuration text; the extension picks the format
    pub fn parse(content: &str, extension: &str) -> Result<Self> {
        let config: Config = match extension {
            "toml" => toml::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse TOML config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?,
            _ => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))?,
        };

        Ok(config)
    }

    /// Apply process environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a valid port: {}", PORT_ENV, port)))?;
        }

        let connection_string =
            lookup(CONNECTION_STRING_ENV).or_else(|| lookup(CONNECTION_STRING_FALLBACK_ENV));
        if let Some(conn) = connection_string {
            if !conn.trim().is_empty() {
                self.store.connection_string = Some(conn);
            }
        }

        Ok(())
    }

    /// Reject settings the feed cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.store.table_name.trim().is_empty() {
            return Err(Error::Config("store.table_name must not be empty".to_string()));
        }
        if self.feed.default_window_secs == 0 {
            return Err(Error::Config("feed.default_window_secs must be positive".to_string()));
        }

        let corrections = [
            ("heading_correction", self.feed.heading_correction),
            ("pitch_correction", self.feed.pitch_correction),
            ("roll_correction", self.feed.roll_correction),
            ("declination.fixed_degrees", self.feed.declination.fixed_degrees),
        ];
        for (name, value) in corrections {
            if !value.is_finite() {
                return Err(Error::Config(format!("feed.{} must be finite", name)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Directory served for every path not handled by the API
    pub static_dir: String,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            static_dir: "public".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Azure storage connection string
    pub connection_string: Option<String>,
    /// Table holding the telemetry entities
    pub table_name: String,
    /// Per-page request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            table_name: "assettracker".to_string(),
            request_timeout_ms: 30000,
        }
    }
}

/// Mounting calibration and query defaults for the fix feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Trailing window used when a request names no bound
    pub default_window_secs: u64,
    /// Added to the raw `x` sensor value, degrees
    pub heading_correction: f64,
    /// Added to the raw `y` sensor value, degrees
    pub pitch_correction: f64,
    /// Added to the raw `z` sensor value, degrees
    pub roll_correction: f64,
    /// Geomagnetic model used for true heading
    pub declination: DeclinationConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_window_secs: 24 * 60 * 60, // 24 hours
            heading_correction: -90.0,
            pitch_correction: 0.0,
            roll_correction: 0.0,
            declination: DeclinationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinationModelKind {
    /// Centred dipole derived from the IGRF first-degree coefficients
    #[default]
    Dipole,
    /// Same declination everywhere
    Fixed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclinationConfig {
    pub model: DeclinationModelKind,
    /// Used by the fixed model only
    pub fixed_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_deployment() {
        let config = Config::default();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.table_name, "assettracker");
        assert_eq!(config.feed.default_window_secs, 86400);
        assert!((config.feed.heading_correction + 90.0).abs() < f64::EPSILON);
        assert_eq!(config.feed.declination.model, DeclinationModelKind::Dipole);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::parse(
            r#"
            [feed]
            default_window_secs = 3600
            pitch_correction = -1.0

            [feed.declination]
            model = "fixed"
            fixed_degrees = 12.5
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.feed.default_window_secs, 3600);
        assert!((config.feed.pitch_correction + 1.0).abs() < f64::EPSILON);
        assert!((config.feed.heading_correction + 90.0).abs() < f64::EPSILON);
        assert_eq!(config.feed.declination.model, DeclinationModelKind::Fixed);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml =
            Config::parse("server:\n  port: 8088\nlogging:\n  format: json\n", "yml").unwrap();
        assert_eq!(yaml.server.port, 8088);
        assert_eq!(yaml.logging.format, LogFormat::Json);

        let json = Config::parse(r#"{"store": {"table_name": "fixes"}}"#, "json").unwrap();
        assert_eq!(json.store.table_name, "fixes");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Config::parse("[feed\n", "toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stirling.toml");
        tokio::fs::write(&path, "[server]\nport = 7000\n").await.unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (PORT_ENV, "8123"),
            (CONNECTION_STRING_FALLBACK_ENV, "fallback"),
            (CONNECTION_STRING_ENV, "AccountName=a;AccountKey=a2V5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8123);
        assert_eq!(
            config.store.connection_string.as_deref(),
            Some("AccountName=a;AccountKey=a2V5")
        );
    }

    #[test]
    fn test_env_fallback_connection_string() {
        let mut config = Config::default();
        let lookup =
            |key: &str| (key == CONNECTION_STRING_FALLBACK_ENV).then(|| "fallback".to_string());
        config.apply_overrides(lookup).unwrap();

        assert_eq!(config.store.connection_string.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == PORT_ENV).then(|| "ninety".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.feed.default_window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.feed.roll_correction = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.table_name = " ".to_string();
        assert!(config.validate().is_err());
    }
}
