// ⚙️ Configuration - TOML file + BANKDIR_* env + CLI overrides
//
// Priority (highest to lowest):
// 1. CLI arguments
// 2. Environment variables
// 3. Config file
// 4. Default values

use crate::directory::display::{ExclusionRule, FeatureExclusions};
use crate::directory::search::{FuzzyMatcher, DEFAULT_SEARCH_THRESHOLD};
use crate::slices::RenderOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid search threshold: {0}. Must be a number between 0.0 and 1.0")]
    InvalidThreshold(String),

    #[error("Configuration file error: {0}")]
    FileError(String),
}

// ============================================================================
// LOG LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr<Err = ConfigError>,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(&s).map_err(serde::de::Error::custom)
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Normalized edit-distance tolerance for bank name search (0.0 - 1.0)
    pub threshold: f64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEARCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Force slice diagnostics on/off. Unset: on everywhere but production.
    pub dev_diagnostics: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureSection {
    /// Replaces the built-in feature exclusion table when set
    pub exclusions: Option<Vec<ExclusionRule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Backend snapshot used by the CLI/server when no path is given
    pub records_path: Option<PathBuf>,
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(deserialize_with = "deserialize_from_str")]
    pub environment: Environment,
    #[serde(deserialize_with = "deserialize_from_str")]
    pub log_level: LogLevel,
    pub server: ServerSection,
    pub search: SearchSection,
    pub render: RenderSection,
    pub features: FeatureSection,
    pub data: DataSection,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `BANKDIR_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("BANKDIR_ENV") {
            self.environment = Environment::from_str(&env)?;
        }
        if let Some(level) = lookup("BANKDIR_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(host) = lookup("BANKDIR_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BANKDIR_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(threshold) = lookup("BANKDIR_SEARCH_THRESHOLD") {
            self.search.threshold = threshold
                .parse()
                .map_err(|_| ConfigError::InvalidThreshold(threshold))?;
        }
        if let Some(path) = lookup("BANKDIR_RECORDS") {
            self.data.records_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(env) = &cli.environment {
            self.environment = Environment::from_str(env)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort("0".to_string()));
        }
        let t = self.search.threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::InvalidThreshold(t.to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Renderer options derived from environment + explicit override
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            dev_diagnostics: self
                .render
                .dev_diagnostics
                .unwrap_or(!self.environment.is_production()),
        }
    }

    pub fn matcher(&self) -> FuzzyMatcher {
        FuzzyMatcher::new(self.search.threshold)
    }

    /// Configured exclusion table, or the built-in one
    pub fn exclusions(&self) -> FeatureExclusions {
        match &self.features.exclusions {
            Some(rules) => FeatureExclusions::new(rules.clone()),
            None => FeatureExclusions::default(),
        }
    }
}

/// Overrides coming from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub environment: Option<String>,
}

/// Build configuration from all sources
pub fn build_config(cli: &CliOverrides) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.merge_with_cli(cli)?;
    config.validate()?;

    Ok(config)
}
