use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::floors::{DEFAULT_FLOOR_FALLBACK_LEN, DEFAULT_GROUND_FLOOR_TOKEN};
use crate::orders::{
    validate_template, DEFAULT_CORRECTIVE_MARKER, DEFAULT_ORDER_CODE_TEMPLATE,
    DEFAULT_ORDER_NUMBER_DIGITS, DEFAULT_PREVENTIVE_MARKER,
};
use crate::tags::{
    DEFAULT_GENERIC_PREFIX, DEFAULT_LOCATION_TOKEN_MAX_LEN, DEFAULT_TAG_SEQUENCE_DIGITS,
};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://facility.db?mode=rwc";
const CONFIG_DIR: &str = "config";
const DEFAULT_MAX_INSERT_ATTEMPTS: u32 = 3;

/// Fixed tokens end up verbatim in stored identifiers and in prefix lookups.
static IDENTIFIER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+$").expect("identifier token pattern is valid"));

/// Settings for tag and order code generation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_distinct_markers"))]
pub struct IdentifierConfig {
    /// Zero padding of the tag sequence segment
    #[serde(default = "default_tag_sequence_digits")]
    #[validate(range(min = 1, max = 12))]
    pub tag_sequence_digits: usize,

    /// Maximum length of the location segment
    #[serde(default = "default_location_token_max_len")]
    #[validate(range(min = 1, max = 64))]
    pub location_token_max_len: usize,

    /// Token length for floors whose name carries no number
    #[serde(default = "default_floor_fallback_len")]
    #[validate(range(min = 1, max = 16))]
    pub floor_fallback_len: usize,

    /// Prefix for assets matching no equipment keyword
    #[serde(default = "default_generic_prefix")]
    #[validate(length(min = 1, max = 8), custom = "validate_identifier_token")]
    pub generic_prefix: String,

    /// Token for the ground floor
    #[serde(default = "default_ground_floor_token")]
    #[validate(length(min = 1, max = 8), custom = "validate_identifier_token")]
    pub ground_floor_token: String,

    /// Insert attempts before a uniqueness conflict is reported
    #[serde(default = "default_max_insert_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_insert_attempts: u32,

    /// Order code layout using `{acronym}`, `{marker}` and `{number}`
    #[serde(default = "default_order_code_template")]
    #[validate(custom = "validate_order_code_template")]
    pub order_code_template: String,

    /// Zero padding of the order number
    #[serde(default = "default_order_number_digits")]
    #[validate(range(min = 1, max = 12))]
    pub order_number_digits: usize,

    /// Must differ from `corrective_marker`
    #[serde(default = "default_preventive_marker")]
    #[validate(length(min = 1, max = 8), custom = "validate_identifier_token")]
    pub preventive_marker: String,

    #[serde(default = "default_corrective_marker")]
    #[validate(length(min = 1, max = 8), custom = "validate_identifier_token")]
    pub corrective_marker: String,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            tag_sequence_digits: default_tag_sequence_digits(),
            location_token_max_len: default_location_token_max_len(),
            floor_fallback_len: default_floor_fallback_len(),
            generic_prefix: default_generic_prefix(),
            ground_floor_token: default_ground_floor_token(),
            max_insert_attempts: default_max_insert_attempts(),
            order_code_template: default_order_code_template(),
            order_number_digits: default_order_number_digits(),
            preventive_marker: default_preventive_marker(),
            corrective_marker: default_corrective_marker(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Identifier generation settings
    #[serde(default)]
    #[validate]
    pub identifiers: IdentifierConfig,
}

impl AppConfig {
    /// Creates a new configuration with defaults for everything but the essentials
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            identifiers: IdentifierConfig::default(),
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn identifiers(&self) -> &IdentifierConfig {
        &self.identifiers
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_tag_sequence_digits() -> usize {
    DEFAULT_TAG_SEQUENCE_DIGITS
}
fn default_location_token_max_len() -> usize {
    DEFAULT_LOCATION_TOKEN_MAX_LEN
}
fn default_floor_fallback_len() -> usize {
    DEFAULT_FLOOR_FALLBACK_LEN
}
fn default_generic_prefix() -> String {
    DEFAULT_GENERIC_PREFIX.to_string()
}
fn default_ground_floor_token() -> String {
    DEFAULT_GROUND_FLOOR_TOKEN.to_string()
}
fn default_max_insert_attempts() -> u32 {
    DEFAULT_MAX_INSERT_ATTEMPTS
}
fn default_order_code_template() -> String {
    DEFAULT_ORDER_CODE_TEMPLATE.to_string()
}
fn default_order_number_digits() -> usize {
    DEFAULT_ORDER_NUMBER_DIGITS
}
fn default_preventive_marker() -> String {
    DEFAULT_PREVENTIVE_MARKER.to_string()
}
fn default_corrective_marker() -> String {
    DEFAULT_CORRECTIVE_MARKER.to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_order_code_template(template: &str) -> Result<(), ValidationError> {
    validate_template(template).map_err(|message| {
        let mut err = ValidationError::new("order_code_template");
        err.message = Some(message.into());
        err
    })
}

fn validate_identifier_token(token: &str) -> Result<(), ValidationError> {
    if IDENTIFIER_TOKEN.is_match(token) {
        Ok(())
    } else {
        let mut err = ValidationError::new("identifier_token");
        err.message = Some("Must contain only uppercase letters and digits".into());
        Err(err)
    }
}

/// Preventive and corrective codes share a template, so equal markers would
/// make both counters render the same codes.
fn validate_distinct_markers(cfg: &IdentifierConfig) -> Result<(), ValidationError> {
    if cfg.preventive_marker == cfg.corrective_marker {
        let mut err = ValidationError::new("distinct_markers");
        err.message = Some("preventive_marker and corrective_marker must differ".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("facility_codes={},sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*), e.g. `APP__IDENTIFIERS__MAX_INSERT_ATTEMPTS=5`
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new("sqlite::memory:".into(), "test".into())
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn template_without_number_is_rejected() {
        let mut cfg = base_config();
        cfg.identifiers.order_code_template = "{marker}-{acronym}".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn insert_attempts_are_bounded() {
        let mut cfg = base_config();
        cfg.identifiers.max_insert_attempts = 0;
        assert!(cfg.validate().is_err());

        cfg.identifiers.max_insert_attempts = 50;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut cfg = base_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn template_without_marker_is_rejected() {
        let mut cfg = base_config();
        cfg.identifiers.order_code_template = "{acronym}-{number}".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn markers_must_differ() {
        let mut cfg = base_config();
        cfg.identifiers.corrective_marker = cfg.identifiers.preventive_marker.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fixed_tokens_are_uppercase_alphanumeric() {
        for prefix in ["eq_", "eqp", "EQ%", "EQ-P"] {
            let mut cfg = base_config();
            cfg.identifiers.generic_prefix = prefix.into();
            assert!(cfg.validate().is_err(), "{prefix} should be rejected");
        }

        let mut cfg = base_config();
        cfg.identifiers.ground_floor_token = "t".into();
        assert!(cfg.validate().is_err());

        let mut cfg = base_config();
        cfg.identifiers.preventive_marker = "OM.P".into();
        assert!(cfg.validate().is_err());

        let mut cfg = base_config();
        cfg.identifiers.generic_prefix = "EQ2".into();
        assert!(cfg.validate().is_ok());
    }
}
