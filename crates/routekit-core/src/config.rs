//! Test configuration and project configuration

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::FrameworkSelector;
use crate::render::DocInfo;

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Settings for one contract test run.
///
/// JSON field names are `baseUrl`, `headers`, `timeout`, `validateSchema`,
/// `paramValues`; snake_case spellings are accepted too so the same table
/// reads naturally inside a TOML project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    /// Base URL of the running service
    #[serde(alias = "base_url")]
    pub base_url: String,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Validate response bodies against declared schemas
    #[serde(default, alias = "validate_schema")]
    pub validate_schema: bool,

    /// Literal values by parameter / property name, used ahead of examples
    #[serde(default, alias = "param_values")]
    pub param_values: BTreeMap<String, Value>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

impl TestConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: BTreeMap::new(),
            timeout: None,
            validate_schema: false,
            param_values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_validate_schema(mut self, validate: bool) -> Self {
        self.validate_schema = validate;
        self
    }

    #[must_use]
    pub fn with_param_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.param_values.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms())
    }
}

/// Process-wide minimum log severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn to_slog(self) -> slog::Level {
        match self {
            Self::Debug => slog::Level::Debug,
            Self::Info => slog::Level::Info,
            Self::Warn => slog::Level::Warning,
            Self::Error => slog::Level::Error,
        }
    }

    /// One step more verbose per count, saturating at debug.
    #[must_use]
    pub const fn raised_by(self, steps: u8) -> Self {
        let mut level = self;
        let mut i = 0;
        while i < steps {
            level = match level {
                Self::Error => Self::Warn,
                Self::Warn => Self::Info,
                Self::Info | Self::Debug => Self::Debug,
            };
            i += 1;
        }
        level
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::Parse(format!(
                "unknown log level '{other}' (expected debug, info, warn or error)"
            ))),
        }
    }
}

/// Where to read a host introspection snapshot from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Host snapshot (JSON or YAML)
    pub host: PathBuf,

    /// Framework of the host, or `auto`
    #[serde(default)]
    pub framework: FrameworkSelector,
}

/// Project configuration (`.routekit.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint list path (JSON or YAML)
    #[serde(default = "default_endpoints")]
    pub endpoints: PathBuf,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for persisted test reports (default: ".routekit/reports")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,

    #[serde(default)]
    pub test: TestConfig,

    #[serde(default)]
    pub docs: DocInfo,
}

fn default_endpoints() -> PathBuf {
    PathBuf::from("endpoints.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            log_level: LogLevel::default(),
            report_dir: None,
            source: None,
            test: TestConfig::default(),
            docs: DocInfo::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_REPORT_DIR: &'static str = ".routekit/reports";

    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first default location that exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// [`Config::load_default`] relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a file exists but cannot be read or parsed
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        for name in [".routekit.toml", ".routekit.json", "routekit.toml"] {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_REPORT_DIR))
    }

    /// Serialize for the per-run snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if a configured value has no TOML representation (e.g. `null`)
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Text written by `routekit init`
    #[must_use]
    pub fn example() -> &'static str {
        r#"# routekit configuration

# Endpoint list produced by `routekit extract` (JSON or YAML)
endpoints = "endpoints.json"

# Minimum log level: debug, info, warn, error
log_level = "info"

# Where `routekit test` stores run reports
# report_dir = ".routekit/reports"

# Host introspection snapshot for `routekit extract`
# [source]
# host = "host-snapshot.json"
# framework = "auto"   # auto, express, koa, fastify, nestjs, openapi

[test]
base_url = "http://localhost:3000"
# Per-request timeout in milliseconds (default 5000)
timeout = 5000
# Validate response bodies against declared schemas
validate_schema = false

[test.headers]
# Authorization = "Bearer your-token-here"

# Literal values by parameter or body property name
[test.param_values]
# id = 1
# email = "someone@example.com"

[docs]
title = "API Documentation"
version = "1.0.0"
# description = "..."
# baseUrl = "https://api.example.com"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Framework;
    use serde_json::json;

    #[test]
    fn test_config_json_field_names() {
        let config: TestConfig = serde_json::from_value(json!({
            "baseUrl": "http://localhost:4000",
            "headers": {"Authorization": "Bearer t"},
            "timeout": 250,
            "validateSchema": true,
            "paramValues": {"id": 7, "name": "x"}
        }))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.headers["Authorization"], "Bearer t");
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert!(config.validate_schema);
        assert_eq!(config.param_values["id"], json!(7));
    }

    #[test]
    fn test_config_defaults() {
        let config: TestConfig =
            serde_json::from_value(json!({"baseUrl": "http://x"})).unwrap();
        assert!(config.headers.is_empty());
        assert!(!config.validate_schema);
        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(config.param_values.is_empty());
    }

    #[test]
    fn test_config_requires_base_url() {
        let err = serde_json::from_value::<TestConfig>(json!({"timeout": 10})).unwrap_err();
        assert!(err.to_string().contains("baseUrl"));
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.endpoints, PathBuf::from("endpoints.json"));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.report_dir(), PathBuf::from(".routekit/reports"));
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
endpoints = "api/endpoints.yaml"
log_level = "debug"

[source]
host = "snapshot.json"
framework = "nest"

[test]
base_url = "http://localhost:8080"
validate_schema = true

[test.headers]
X-Api-Key = "k"

[test.param_values]
id = 42
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.endpoints, PathBuf::from("api/endpoints.yaml"));
        assert_eq!(config.log_level, LogLevel::Debug);
        let source = config.source.unwrap();
        assert_eq!(source.framework, FrameworkSelector::Explicit(Framework::NestJs));
        assert_eq!(config.test.base_url, "http://localhost:8080");
        assert!(config.test.validate_schema);
        assert_eq!(config.test.headers["X-Api-Key"], "k");
        assert_eq!(config.test.param_values["id"], json!(42));
        assert_eq!(config.docs, DocInfo::default());
    }

    #[test]
    fn example_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.test.base_url, "http://localhost:3000");
        assert_eq!(config.test.timeout, Some(5000));
        assert_eq!(config.docs.title, "API Documentation");
    }

    #[test]
    fn snapshot_round_trips() {
        let config = Config {
            test: TestConfig::new("http://api").with_param_value("id", json!(1)),
            ..Config::default()
        };
        let text = config.to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn load_default_falls_back_and_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_default_in(dir.path()).unwrap(), Config::default());

        std::fs::write(
            dir.path().join(".routekit.json"),
            r#"{"endpoints": "e.json", "test": {"baseUrl": "http://json"}}"#,
        )
        .unwrap();
        let config = Config::load_default_in(dir.path()).unwrap();
        assert_eq!(config.test.base_url, "http://json");
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routekit.toml");
        std::fs::write(&path, "endpoints = [").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(..))
        ));
    }

    #[test]
    fn log_level_parsing_and_raising() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Warn.raised_by(1), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised_by(5), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.to_slog(), slog::Level::Warning);
    }
}
