use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "APP";
const DEV_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";
const MIN_SECRET_LEN: usize = 64;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Serde defaults for optional settings.
mod defaults {
    pub const ENVIRONMENT: &str = "development";
    pub const DATABASE_URL: &str = "sqlite://powerloom.db?mode=rwc";
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8000;
    pub const LOG_LEVEL: &str = "info";
    /// One working day.
    pub const JWT_EXPIRATION: usize = 24 * 60 * 60;

    pub fn port() -> u16 {
        PORT
    }
    pub fn log_level() -> String {
        LOG_LEVEL.to_string()
    }
    pub fn jwt_expiration() -> usize {
        JWT_EXPIRATION
    }
    pub fn yes() -> bool {
        true
    }
    pub fn pool_max() -> u32 {
        16
    }
    pub fn pool_min() -> u32 {
        2
    }
    pub fn connect_timeout() -> u64 {
        30
    }
    pub fn idle_timeout() -> u64 {
        600
    }
    pub fn acquire_timeout() -> u64 {
        8
    }
    pub fn request_timeout() -> u64 {
        30
    }
    pub fn issuer() -> String {
        "powerloom-auth".to_string()
    }
    pub fn audience() -> String {
        "powerloom-api".to_string()
    }
}

/// Runtime settings, layered from `config/*.toml` and `APP__*` variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// `sqlite://...` or `postgres://...`
    pub database_url: String,

    #[validate(custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    #[serde(default = "defaults::jwt_expiration")]
    #[validate(range(min = 300, max = 604800))]
    pub jwt_expiration: usize,

    pub host: String,
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// `development` relaxes the CORS and secret checks
    pub environment: String,

    #[serde(default = "defaults::log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub auto_migrate: bool,
    /// Insert the default workshops, machines, customers, presets and admin
    /// account when the tables are empty
    #[serde(default = "defaults::yes")]
    pub seed_defaults: bool,
    /// Mark a beam completed once a delivery leaves zero meters on it
    #[serde(default)]
    pub beam_auto_complete: bool,

    /// Comma-separated origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
    #[serde(default)]
    pub cors_allow_any_origin: bool,
    #[serde(default)]
    pub cors_allow_credentials: bool,

    #[serde(default = "defaults::pool_max")]
    pub db_max_connections: u32,
    #[serde(default = "defaults::pool_min")]
    pub db_min_connections: u32,
    #[serde(default = "defaults::connect_timeout")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "defaults::idle_timeout")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "defaults::acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "defaults::issuer")]
    pub auth_issuer: String,
    #[serde(default = "defaults::audience")]
    pub auth_audience: String,
}

impl AppConfig {
    /// Settings for the given connection and listener; everything else defaulted.
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: defaults::log_level(),
            log_json: false,
            auto_migrate: false,
            seed_defaults: defaults::yes(),
            beam_auto_complete: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: defaults::pool_max(),
            db_min_connections: defaults::pool_min(),
            db_connect_timeout_secs: defaults::connect_timeout(),
            db_idle_timeout_secs: defaults::idle_timeout(),
            db_acquire_timeout_secs: defaults::acquire_timeout(),
            request_timeout_secs: defaults::request_timeout(),
            auth_issuer: defaults::issuer(),
            auth_audience: defaults::audience(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Origins listed in `cors_allowed_origins`, blanks dropped.
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Permissive CORS is used in development, or when explicitly enabled.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Cross-field rules that only matter once the service leaves a laptop.
    pub(crate) fn check_deployment(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let has_origins = !self.cors_origins().is_empty();

        if !has_origins && !self.should_allow_permissive_cors() {
            reject(
                &mut errors,
                "cors_allowed_origins",
                "cors_origins_missing",
                "set APP__CORS_ALLOWED_ORIGINS, or APP__CORS_ALLOW_ANY_ORIGIN=true to accept any origin",
            );
        }
        if self.cors_allow_credentials && self.cors_allow_any_origin && !has_origins {
            reject(
                &mut errors,
                "cors_allow_credentials",
                "cors_credentials_wildcard",
                "credentials cannot be allowed for a wildcard origin",
            );
        }
        if !self.is_development() && self.jwt_secret.trim() == DEV_JWT_SECRET {
            reject(
                &mut errors,
                "jwt_secret",
                "jwt_secret_is_dev_default",
                "the development JWT secret is only accepted with environment=development",
            );
        }
        if self.db_min_connections > self.db_max_connections {
            reject(
                &mut errors,
                "db_min_connections",
                "db_pool_bounds",
                "db_min_connections exceeds db_max_connections",
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn reject(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: &'static str,
) {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    let mut err = ValidationError::new("log_level");
    err.message = Some(format!("expected one of {}", LOG_LEVELS.join(", ")).into());
    Err(err)
}

/// Rejects short, repetitive or guessable signing secrets.
fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let secret = secret.trim();
    let distinct: HashSet<char> = secret.chars().collect();
    let lower = secret.to_ascii_lowercase();

    let problem = if secret.len() < MIN_SECRET_LEN {
        Some("must be at least 64 characters")
    } else if distinct.len() < 10 {
        Some("needs at least 10 distinct characters")
    } else if ["changeme", "password", "admin123", "12345", "abcdef"]
        .iter()
        .any(|weak| lower.contains(weak))
    {
        Some("contains a guessable fragment")
    } else {
        None
    };

    match problem {
        None => Ok(()),
        Some(reason) => {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some(format!("jwt_secret {}", reason).into());
            Err(err)
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(format!("powerloom_api={},tower_http=debug", level)));

    let builder = fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Loads the configuration.
///
/// Sources, later ones winning: built-in defaults, `config/default.toml`,
/// `config/{RUN_ENV}.toml`, then `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string());

    if !Path::new(CONFIG_DIR).is_dir() {
        info!(dir = CONFIG_DIR, "no config directory; using defaults and environment");
    }

    let layered = Config::builder()
        .set_default("database_url", defaults::DATABASE_URL)?
        .set_default("jwt_expiration", defaults::JWT_EXPIRATION as i64)?
        .set_default("host", defaults::HOST)?
        .set_default("port", i64::from(defaults::PORT))?
        .set_default("environment", defaults::ENVIRONMENT)?
        .set_default("log_level", defaults::LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // No built-in secret: it has to come from a file or APP__JWT_SECRET.
    if layered.get_string("jwt_secret").is_err() {
        error!("jwt_secret is not configured; set APP__JWT_SECRET");
        return Err(ConfigError::NotFound("jwt_secret".into()).into());
    }

    let cfg: AppConfig = layered.try_deserialize()?;
    if let Err(e) = cfg.validate().and_then(|_| cfg.check_deployment()) {
        error!(errors = ?e, "configuration rejected");
        return Err(e.into());
    }

    info!(environment = %cfg.environment, run_env = %run_env, "configuration loaded");
    Ok(cfg)
}
