//! Environment configuration, read once in `main`.

use std::fmt;
use std::time::Duration;

use crate::auth::password;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_RESTAURANT_ID: &str = "restaurant_1";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@orderdesk.local";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_DESK_IDLE_MINUTES: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
    Hash(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {key}: '{value}'"),
            ConfigError::Hash(e) => write!(f, "Failed to hash admin password: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub bind: String,
    pub restaurant_id: String,
    pub admin: AdminAccount,
    pub desk_idle_timeout: Duration,
    pub session_key: Option<String>,
    /// Insert the demo orders into an empty restaurant on startup.
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("ORDERDESK_STORE").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "ORDERDESK_STORE", value: other.to_string() });
            }
        };

        let database_url = get("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let desk_idle_minutes = match get("ORDERDESK_DESK_IDLE_MINUTES") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "ORDERDESK_DESK_IDLE_MINUTES",
                    value: v.clone(),
                })?,
            None => DEFAULT_DESK_IDLE_MINUTES,
        };

        let seed_demo = match get("ORDERDESK_SEED_DEMO").as_deref().map(str::trim) {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "ORDERDESK_SEED_DEMO", value: other.to_string() });
            }
        };

        let email = get("ORDERDESK_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());
        let password_hash = match (get("ORDERDESK_ADMIN_PASSWORD_HASH"), get("ORDERDESK_ADMIN_PASSWORD")) {
            (Some(hash), _) => hash,
            (None, Some(plain)) => password::hash_password(&plain).map_err(ConfigError::Hash)?,
            (None, None) => {
                log::warn!("No admin password configured, using the default (change it!)");
                password::hash_password(DEFAULT_ADMIN_PASSWORD).map_err(ConfigError::Hash)?
            }
        };

        Ok(AppConfig {
            backend,
            database_url,
            bind: get("ORDERDESK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            restaurant_id: get("ORDERDESK_RESTAURANT_ID")
                .unwrap_or_else(|| DEFAULT_RESTAURANT_ID.to_string()),
            admin: AdminAccount { email: email.trim().to_lowercase(), password_hash },
            desk_idle_timeout: Duration::from_secs(desk_idle_minutes * 60),
            session_key: get("SESSION_KEY"),
            seed_demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = config(&[("ORDERDESK_STORE", "memory"), ("ORDERDESK_ADMIN_PASSWORD_HASH", "$argon2id$x")]).unwrap();
        assert_eq!(cfg.backend, StoreBackend::Memory);
        assert_eq!(cfg.bind, DEFAULT_BIND);
        assert_eq!(cfg.restaurant_id, DEFAULT_RESTAURANT_ID);
        assert_eq!(cfg.desk_idle_timeout, Duration::from_secs(30 * 60));
        assert_eq!(cfg.admin.password_hash, "$argon2id$x");
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = config(&[("ORDERDESK_ADMIN_PASSWORD_HASH", "h")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("ORDERDESK_ADMIN_PASSWORD_HASH", "h"),
            ("ORDERDESK_ADMIN_EMAIL", " Owner@Example.com "),
            ("ORDERDESK_DESK_IDLE_MINUTES", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, StoreBackend::Postgres);
        assert_eq!(cfg.admin.email, "owner@example.com");
        assert_eq!(cfg.desk_idle_timeout, Duration::from_secs(300));
        assert!(!cfg.seed_demo);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config(&[("ORDERDESK_STORE", "redis")]).is_err());
        assert!(config(&[
            ("ORDERDESK_STORE", "memory"),
            ("ORDERDESK_ADMIN_PASSWORD_HASH", "h"),
            ("ORDERDESK_DESK_IDLE_MINUTES", "0"),
        ])
        .is_err());
        assert!(config(&[
            ("ORDERDESK_STORE", "memory"),
            ("ORDERDESK_ADMIN_PASSWORD_HASH", "h"),
            ("ORDERDESK_SEED_DEMO", "maybe"),
        ])
        .is_err());
    }

    #[test]
    fn plain_password_is_hashed() {
        let cfg = config(&[("ORDERDESK_STORE", "memory"), ("ORDERDESK_ADMIN_PASSWORD", "s3cret")]).unwrap();
        assert!(password::verify_password("s3cret", &cfg.admin.password_hash).unwrap());
    }
}
