//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_JENKINS_BASE_URL: &str = "http://localhost:8081";
    pub const DEV_BUILDS_FILE: &str = "./data/builds.json";
    pub const DEV_REQUEST_TIMEOUT_SECS: u64 = 30; // Per Allure read
    pub const DEV_CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const DEV_RETRY_ATTEMPTS: u32 = 0; // Extra attempts per failed build
    pub const DEV_REFRESH_INTERVAL_SECS: u64 = 300; // 0 disables background refresh
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Jenkins connection settings.
#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    /// Jenkins base URL
    pub base_url: String,
    /// Initial session cookie value (can be replaced at runtime)
    pub session: Option<SecretString>,
    /// Upper bound for each Allure read
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// JSON file holding the tracked builds
    pub builds_file: PathBuf,
    /// Extra batch-level attempts for builds that failed to fetch
    pub retry_attempts: u32,
    /// Background refresh interval in seconds (0 = disabled)
    pub refresh_interval_secs: u64,
    /// Jenkins connection settings
    pub jenkins: JenkinsSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development):
    /// - All variables have sensible defaults
    /// - Only RUST_ENV is required
    ///
    /// In production mode (RUST_ENV=production):
    /// - JENKINS_BASE_URL is required
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `DASH_HOST`: Server host (default: 127.0.0.1)
    /// - `DASH_PORT`: Server port (default: 8080)
    /// - `JENKINS_BASE_URL`: Jenkins base URL (required in production)
    /// - `JENKINS_JSESSIONID`: Session cookie value (optional, can be set via API)
    /// - `DASH_BUILDS_FILE`: Build list file (default: ./data/builds.json)
    /// - `DASH_REQUEST_TIMEOUT_SECS`: Per-read timeout (default: 30)
    /// - `DASH_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 5)
    /// - `DASH_RETRY_ATTEMPTS`: Extra attempts per failed build (default: 0)
    /// - `DASH_REFRESH_INTERVAL_SECS`: Background refresh interval, 0 disables (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Parse environment - required
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("DASH_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("DASH_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("DASH_PORT must be a valid port number"))?;

        let base_url = env::var("JENKINS_BASE_URL")
            .unwrap_or_else(|_| defaults::DEV_JENKINS_BASE_URL.to_string());
        reqwest::Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("JENKINS_BASE_URL must be an absolute URL"))?;

        let session = env::var("JENKINS_JSESSIONID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        let builds_file = env::var("DASH_BUILDS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::DEV_BUILDS_FILE));

        let request_timeout_secs = env::var("DASH_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::DEV_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidValue(
                "DASH_REQUEST_TIMEOUT_SECS must be a positive number",
            ))?;

        let connect_timeout_secs = env::var("DASH_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::DEV_CONNECT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidValue(
                "DASH_CONNECT_TIMEOUT_SECS must be a positive number",
            ))?;

        let retry_attempts = env::var("DASH_RETRY_ATTEMPTS")
            .unwrap_or_else(|_| defaults::DEV_RETRY_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("DASH_RETRY_ATTEMPTS must be a valid number"))?;

        let refresh_interval_secs = env::var("DASH_REFRESH_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults::DEV_REFRESH_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("DASH_REFRESH_INTERVAL_SECS must be a valid number")
            })?;

        let config = Config {
            environment,
            host,
            port,
            builds_file,
            retry_attempts,
            refresh_interval_secs,
            jenkins: JenkinsSettings {
                base_url,
                session,
                request_timeout: Duration::from_secs(request_timeout_secs),
                connect_timeout: Duration::from_secs(connect_timeout_secs),
            },
        };

        // Validate production configuration
        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.jenkins.base_url == defaults::DEV_JENKINS_BASE_URL {
            errors.push(format!(
                "JENKINS_BASE_URL is using development default '{}'. Set your Jenkins URL.",
                defaults::DEV_JENKINS_BASE_URL
            ));
        }

        if self.host == "0.0.0.0" && self.jenkins.session.is_some() {
            errors.push(
                "JENKINS_JSESSIONID is set while binding to all interfaces. \
                 Anyone reaching the dashboard would act with that session."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
