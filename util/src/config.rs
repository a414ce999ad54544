//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Default alphabet for check-in tokens: upper-case letters and digits without
/// the easily confused `I`, `O`, `0` and `1`.
pub const DEFAULT_TOKEN_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub token_ttl_seconds: i64,
    pub token_length: usize,
    pub token_alphabet: String,
    pub enforce_roster: bool,
    pub ws_outbox_capacity: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

/// Parses `key` from the environment, falling back to `default` when the
/// variable is missing or malformed.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, ?default, "Malformed config value, using default");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let token_alphabet = env::var("TOKEN_ALPHABET")
            .ok()
            .filter(|a| a.chars().count() >= 2)
            .unwrap_or_else(|| DEFAULT_TOKEN_ALPHABET.into());

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "roll-call".into()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "api=info,services=info,util=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/roll_call.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_or("PORT", 3000),
            token_ttl_seconds: parse_or("TOKEN_TTL_SECONDS", 60i64).max(1),
            token_length: parse_or("TOKEN_LENGTH", 6usize).clamp(4, 64),
            token_alphabet,
            enforce_roster: env::var("ENFORCE_ROSTER").unwrap_or_else(|_| "false".into())
                == "true",
            ws_outbox_capacity: parse_or("WS_OUTBOX_CAPACITY", 256usize).max(1),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_token_ttl_seconds(value: i64) {
        AppConfig::set_field(|cfg| cfg.token_ttl_seconds = value.max(1));
    }

    pub fn set_token_length(value: usize) {
        AppConfig::set_field(|cfg| cfg.token_length = value.clamp(4, 64));
    }

    pub fn set_enforce_roster(value: bool) {
        AppConfig::set_field(|cfg| cfg.enforce_roster = value);
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn token_ttl_seconds() -> i64 {
    AppConfig::global().token_ttl_seconds
}

pub fn token_length() -> usize {
    AppConfig::global().token_length
}

pub fn token_alphabet() -> String {
    AppConfig::global().token_alphabet.clone()
}

pub fn enforce_roster() -> bool {
    AppConfig::global().enforce_roster
}

pub fn ws_outbox_capacity() -> usize {
    AppConfig::global().ws_outbox_capacity
}
