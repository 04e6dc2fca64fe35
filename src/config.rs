//! Configuration management for gym-desk
//!
//! Handles environment variables and application settings.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database URL
    pub database_url: String,

    /// Environment (development, production)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// Frontend directory served at `/` when it exists
    pub frontend_dir: PathBuf,

    /// Data directory for SQLite database
    pub data_dir: PathBuf,

    /// CORS origins (empty means allow all)
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// IANA name of the gym's local timezone
    pub timezone: String,

    /// First minute at which check-in is allowed (local time)
    pub opening_time: NaiveTime,

    /// Last minute at which check-in is allowed (local time)
    pub closing_time: NaiveTime,

    /// Register float added to the cash the system expects at closing
    pub starting_float: Decimal,

    /// Start of the very first reconciliation period
    pub fallback_period_start: DateTime<Utc>,

    /// Outbound mail settings
    pub smtp: SmtpSettings,
}

/// SMTP relay settings. Without a host mail is only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub sender: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            sender: "no-reply@gym-desk.local".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:gym-desk.db".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            frontend_dir: PathBuf::from("./frontend"),
            data_dir: PathBuf::from("./data"),
            cors_origins: vec![],
            request_timeout: 30,
            timezone: "America/Mexico_City".to_string(),
            opening_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            starting_float: Decimal::new(10000, 2),
            fallback_period_start: DateTime::<Utc>::from_timestamp(1_672_531_200, 0)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            smtp: SmtpSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("GYM_DESK_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("GYM_DESK_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }

        // Database configuration
        if let Ok(database_url) = env::var("GYM_DESK_DATABASE_URL") {
            config.database_url = database_url;
        }

        if let Ok(data_dir) = env::var("GYM_DESK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(environment) = env::var("GYM_DESK_ENVIRONMENT") {
            config.environment = environment;
        }

        if let Ok(log_level) = env::var("GYM_DESK_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(frontend_dir) = env::var("GYM_DESK_FRONTEND_DIR") {
            config.frontend_dir = PathBuf::from(frontend_dir);
        }

        if let Ok(cors_origins) = env::var("GYM_DESK_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(timeout) = env::var("GYM_DESK_REQUEST_TIMEOUT") {
            config.request_timeout = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidRequestTimeout(timeout))?;
        }

        // Gym schedule
        if let Ok(timezone) = env::var("GYM_DESK_TIMEZONE") {
            config.timezone = timezone;
        }

        if let Ok(opening) = env::var("GYM_DESK_OPENING_TIME") {
            config.opening_time = parse_clock_time(&opening)?;
        }

        if let Ok(closing) = env::var("GYM_DESK_CLOSING_TIME") {
            config.closing_time = parse_clock_time(&closing)?;
        }

        // Register
        if let Ok(float) = env::var("GYM_DESK_STARTING_FLOAT") {
            config.starting_float = Decimal::from_str(float.trim())
                .map_err(|_| ConfigError::InvalidStartingFloat(float))?;
        }

        if let Ok(start) = env::var("GYM_DESK_FALLBACK_PERIOD_START") {
            config.fallback_period_start = DateTime::parse_from_rfc3339(start.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ConfigError::InvalidFallbackStart(start))?;
        }

        // Mail
        if let Ok(host) = env::var("GYM_DESK_SMTP_HOST") {
            config.smtp.host = Some(host).filter(|h| !h.trim().is_empty());
        }

        if let Ok(port) = env::var("GYM_DESK_SMTP_PORT") {
            config.smtp.port = port.parse().map_err(|_| ConfigError::InvalidSmtpPort(port))?;
        }

        if let Ok(username) = env::var("GYM_DESK_SMTP_USERNAME") {
            config.smtp.username = Some(username).filter(|u| !u.is_empty());
        }

        if let Ok(password) = env::var("GYM_DESK_SMTP_PASSWORD") {
            config.smtp.password = Some(password).filter(|p| !p.is_empty());
        }

        if let Ok(sender) = env::var("GYM_DESK_MAIL_SENDER") {
            config.smtp.sender = sender;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::UnsupportedDatabase(self.database_url.clone()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        if self.opening_time >= self.closing_time {
            return Err(ConfigError::InvalidOpeningHours {
                opening: self.opening_time,
                closing: self.closing_time,
            });
        }

        if self.starting_float.is_sign_negative() {
            return Err(ConfigError::InvalidStartingFloat(self.starting_float.to_string()));
        }

        if Tz::from_str(&self.timezone).is_err() {
            return Err(ConfigError::InvalidTimezone(self.timezone.clone()));
        }

        if self.is_production() && self.smtp.username.is_some() && self.smtp.password.is_none() {
            return Err(ConfigError::MissingSmtpPassword);
        }

        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Get request timeout in milliseconds
    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout * 1000
    }

    /// Parsed gym timezone. Falls back to UTC only if validation was skipped.
    pub fn gym_timezone(&self) -> Tz {
        Tz::from_str(&self.timezone).unwrap_or(Tz::UTC)
    }

    /// Create data directory if it doesn't exist
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| ConfigError::DataDirCreationFailed(e.to_string()))?;
        Ok(())
    }

    /// Get full database path if using SQLite file
    pub fn database_path(&self) -> Option<PathBuf> {
        let path = self.database_url.strip_prefix("sqlite:")?;
        let path = path.trim_start_matches("//");
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }

        let path = PathBuf::from(path);
        if path.is_relative() {
            Some(self.data_dir.join(path))
        } else {
            Some(path)
        }
    }

    /// Connection URL with relative SQLite paths resolved into the data directory
    pub fn resolved_database_url(&self) -> String {
        match self.database_path() {
            Some(path) => format!("sqlite://{}", path.display()),
            None => self.database_url.clone(),
        }
    }

    /// Log configuration (excluding sensitive data)
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Environment: {}", self.environment);
        info!("  Bind address: {}", self.bind_address());
        info!("  Database URL: {}", self.database_url);
        info!("  Data directory: {:?}", self.data_dir);
        info!("  Frontend directory: {:?}", self.frontend_dir);
        info!("  Log level: {}", self.log_level);
        info!("  CORS origins: {:?}", self.cors_origins);
        info!("  Request timeout: {}s", self.request_timeout);
        info!("  Timezone: {}", self.timezone);
        info!("  Opening hours: {} - {}", self.opening_time, self.closing_time);
        info!("  Starting float: {:.2}", self.starting_float);
        info!("  Fallback period start: {}", self.fallback_period_start.to_rfc3339());
        info!("  SMTP: {}", self.mask_smtp());

        if self.smtp.host.is_none() {
            warn!("No SMTP host configured - outgoing mail will only be logged");
        }
    }

    fn mask_smtp(&self) -> String {
        match (&self.smtp.host, &self.smtp.username) {
            (Some(host), Some(user)) => format!("{}@{}:{} (password ***)", user, host, self.smtp.port),
            (Some(host), None) => format!("{}:{}", host, self.smtp.port),
            (None, _) => "disabled".to_string(),
        }
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`) into a local clock time
fn parse_clock_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ConfigError::InvalidClockTime(raw.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid request timeout: {0}")]
    InvalidRequestTimeout(String),

    #[error("Empty database URL")]
    EmptyDatabaseUrl,

    #[error("Unsupported database URL (expected sqlite:): {0}")]
    UnsupportedDatabase(String),

    #[error("Empty data directory")]
    EmptyDataDir,

    #[error("Invalid clock time (expected HH:MM): {0}")]
    InvalidClockTime(String),

    #[error("Opening time {opening} must be before closing time {closing}")]
    InvalidOpeningHours { opening: NaiveTime, closing: NaiveTime },

    #[error("Invalid starting float: {0}")]
    InvalidStartingFloat(String),

    #[error("Invalid fallback period start (expected RFC 3339): {0}")]
    InvalidFallbackStart(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid SMTP port: {0}")]
    InvalidSmtpPort(String),

    #[error("SMTP username configured without a password")]
    MissingSmtpPassword,

    #[error("Data directory creation failed: {0}")]
    DataDirCreationFailed(String),
}
