//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton holding the
//! runtime configuration loaded from environment variables (and `.env` via `dotenvy`).
//! Per-field setters exist so tests can override values without touching the process
//! environment.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub storage_root: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub cookie_secure: bool,
    pub allow_legacy_headers: bool,
    pub max_photo_bytes: usize,
}

static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    matches!(
        env::var(key).map(|v| v.to_ascii_lowercase()).as_deref(),
        Ok("true") | Ok("1") | Ok("yes")
    )
}

impl AppConfig {
    /// Loads the configuration from `.env` and the process environment.
    ///
    /// Missing values fall back to development defaults. `JWT_SECRET` defaults to an
    /// empty string; the server refuses to start without one.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "complaint-desk"),
            log_level: var_or("LOG_LEVEL", "info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: flag("LOG_TO_STDOUT"),
            database_path: var_or("DATABASE_PATH", "data/complaints.db"),
            storage_root: var_or("STORAGE_ROOT", "data/storage"),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", 1440),
            cookie_secure: flag("COOKIE_SECURE"),
            allow_legacy_headers: flag("ALLOW_LEGACY_HEADERS"),
            max_photo_bytes: parse_or("MAX_PHOTO_BYTES", 5 * 1024 * 1024),
        }
    }

    /// Returns a shared read guard on the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Reloads the configuration from the environment, dropping any overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
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

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_storage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.storage_root = value.into());
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_cookie_secure(value: bool) {
        AppConfig::set_field(|cfg| cfg.cookie_secure = value);
    }

    pub fn set_allow_legacy_headers(value: bool) {
        AppConfig::set_field(|cfg| cfg.allow_legacy_headers = value);
    }

    pub fn set_max_photo_bytes(value: usize) {
        AppConfig::set_field(|cfg| cfg.max_photo_bytes = value);
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

pub fn storage_root() -> String {
    AppConfig::global().storage_root.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn cookie_secure() -> bool {
    AppConfig::global().cookie_secure
}

pub fn allow_legacy_headers() -> bool {
    AppConfig::global().allow_legacy_headers
}

pub fn max_photo_bytes() -> usize {
    AppConfig::global().max_photo_bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        AppConfig::set_port(4555);
        AppConfig::set_allow_legacy_headers(true);
        assert_eq!(port(), 4555);
        assert!(allow_legacy_headers());

        unsafe {
            env::remove_var("PORT");
            env::remove_var("ALLOW_LEGACY_HEADERS");
        }
        AppConfig::reset();
        assert_eq!(port(), 3000);
        assert!(!allow_legacy_headers());
    }

    #[test]
    #[serial]
    fn malformed_numbers_fall_back_to_defaults() {
        unsafe {
            env::set_var("JWT_DURATION_MINUTES", "not-a-number");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.jwt_duration_minutes, 1440);
        unsafe {
            env::remove_var("JWT_DURATION_MINUTES");
        }
    }
}
