//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by every environment variable the server reads.
pub const ENV_PREFIX: &str = "DELIVERY_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: text, json")]
    InvalidLogFormat(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid mail settings: {0}")]
    InvalidMail(String),

    #[error("Invalid database path: {0}")]
    InvalidDatabasePath(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
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
    /// Convert log level to tracing filter string
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

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
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

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which transport the mail settings select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// SMTP with STARTTLS
    Smtp,
    /// HTTP JSON relay
    Relay,
    /// Log only, nothing leaves the process
    Log,
}

impl std::fmt::Display for MailBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailBackend::Smtp => write!(f, "smtp"),
            MailBackend::Relay => write!(f, "relay"),
            MailBackend::Log => write!(f, "log"),
        }
    }
}

/// Outbound mail settings
///
/// `smtp_host` selects SMTP, `relay_url` selects the HTTP relay. With
/// neither set quote emails are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender address
    pub from_address: String,
    /// SMTP server, upgraded with STARTTLS
    pub smtp_host: Option<String>,
    /// SMTP submission port
    pub smtp_port: u16,
    /// SMTP login
    pub username: Option<String>,
    /// SMTP password
    pub password: Option<String>,
    /// HTTP mail relay endpoint
    pub relay_url: Option<String>,
    /// Bearer token for the relay
    pub api_token: Option<String>,
    /// Per-message timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "quotes@delivery.local".to_string(),
            smtp_host: None,
            smtp_port: 587,
            username: None,
            password: None,
            relay_url: None,
            api_token: None,
            timeout_secs: 10,
        }
    }
}

impl MailConfig {
    /// Transport these settings select
    pub fn backend(&self) -> MailBackend {
        if self.smtp_host.is_some() {
            MailBackend::Smtp
        } else if self.relay_url.is_some() {
            MailBackend::Relay
        } else {
            MailBackend::Log
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidMail(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.from_address.contains('@') {
            return Err(ConfigError::InvalidMail(format!(
                "from_address '{}' is not an email address",
                self.from_address
            )));
        }
        if self.smtp_host.is_some() && self.relay_url.is_some() {
            return Err(ConfigError::InvalidMail(
                "set either smtp_host or relay_url, not both".to_string(),
            ));
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::InvalidMail(
                "smtp_port must be greater than zero".to_string(),
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::InvalidMail(
                "username and password must be set together".to_string(),
            ));
        }
        if let Some(url) = &self.relay_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidMail(format!(
                    "relay_url '{}' must be an http(s) URL",
                    url
                )));
            }
        }
        Ok(())
    }
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Log output format
    #[serde(deserialize_with = "deserialize_log_format")]
    pub log_format: LogFormat,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Seconds to wait for in-flight requests after a shutdown signal
    pub shutdown_timeout_secs: u64,
    /// Allow any origin, method and header
    pub cors_permissive: bool,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// Outbound mail
    pub mail: MailConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_log_format<'de, D>(deserializer: D) -> Result<LogFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogFormat::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            database_path: PathBuf::from("delivery.db"),
            shutdown_timeout_secs: 30,
            cors_permissive: true,
            environment: Environment::Development,
            mail: MailConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Override fields from `DELIVERY_*` environment variables that are set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from variables resolved by `lookup`
    ///
    /// Only variables that resolve to a value are applied.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(host) = var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log_format = LogFormat::from_str(&format)?;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(timeout) = var("SHUTDOWN_TIMEOUT_SECS") {
            self.shutdown_timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "{}SHUTDOWN_TIMEOUT_SECS is not a number: {}",
                    ENV_PREFIX, timeout
                ))
            })?;
        }
        if let Some(cors) = var("CORS_PERMISSIVE") {
            self.cors_permissive = cors.to_lowercase() == "true";
        }
        if let Some(env) = var("ENV") {
            self.environment = Environment::from_str(&env)?;
        }
        if let Some(from) = var("MAIL_FROM") {
            self.mail.from_address = from;
        }
        if let Some(host) = var("MAIL_SMTP_HOST") {
            self.mail.smtp_host = Some(host).filter(|h| !h.is_empty());
        }
        if let Some(port) = var("MAIL_SMTP_PORT") {
            self.mail.smtp_port = port.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "{}MAIL_SMTP_PORT is not a port number: {}",
                    ENV_PREFIX, port
                ))
            })?;
        }
        if let Some(username) = var("MAIL_USERNAME") {
            self.mail.username = Some(username).filter(|u| !u.is_empty());
        }
        if let Some(password) = var("MAIL_PASSWORD") {
            self.mail.password = Some(password).filter(|p| !p.is_empty());
        }
        if let Some(url) = var("MAIL_RELAY_URL") {
            self.mail.relay_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(token) = var("MAIL_API_TOKEN") {
            self.mail.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(timeout) = var("MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "{}MAIL_TIMEOUT_SECS is not a number: {}",
                    ENV_PREFIX, timeout
                ))
            })?;
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabasePath(
                "database_path must not be empty".to_string(),
            ));
        }
        self.mail.validate()
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
        if let Some(path) = &cli.database_path {
            self.database_path = path.clone();
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
    /// Database path override
    pub database_path: Option<PathBuf>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    config.apply_env()?;
    config.merge_with_cli(cli);
    config.validate()?;

    Ok(config)
}
