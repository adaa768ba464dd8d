use std::time::Duration;

use workshop_cache::WriteBehindConfig;
use workshop_core::error::CoreError;
use workshop_core::tenant::TenantRegistry;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid tenant configuration: {0}")]
    Tenants(#[from] CoreError),
}

/// Where cached values live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// Process-local store. Each instance has its own cache.
    Memory,
    /// Shared Redis store.
    Redis { url: String },
}

/// Cache settings shared by every named cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// TTL of entries in the shared store.
    pub ttl: Duration,
    /// TTL of the in-process tier of near caches.
    pub near_ttl: Duration,
    /// Maximum entries kept in the in-process tier of near caches.
    pub near_max_entries: usize,
    pub write_behind: WriteBehindConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl: Duration::from_secs(300),
            near_ttl: Duration::from_secs(30),
            near_max_entries: 1000,
            write_behind: WriteBehindConfig::default(),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    pub database_url: String,
    /// Pool size (default: `20`).
    pub db_max_connections: u32,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background flushers (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Tenants served by the `/tenant/*` routes.
    pub tenants: TenantRegistry,
    pub cache: CacheConfig,
    /// Load sample movies and countries at startup (default: `false`).
    pub seed_sample_data: bool,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `DATABASE_URL`             | required                   |
    /// | `DB_MAX_CONNECTIONS`       | `20`                       |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `TENANTS`                  | `korean,english`           |
    /// | `DEFAULT_TENANT`           | first of `TENANTS`         |
    /// | `CACHE_BACKEND`            | `memory` (or `redis`)      |
    /// | `REDIS_URL`                | required for `redis`       |
    /// | `CACHE_TTL_SECS`           | `300`                      |
    /// | `NEAR_CACHE_TTL_SECS`      | `30`                       |
    /// | `NEAR_CACHE_MAX_ENTRIES`   | `1000`                     |
    /// | `WRITE_BEHIND_BATCH_SIZE`  | `50`                       |
    /// | `WRITE_BEHIND_FLUSH_MS`    | `1000`                     |
    /// | `WRITE_BEHIND_MAX_RETRIES` | `3`                        |
    /// | `SEED_SAMPLE_DATA`         | `false`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.string("HOST", "0.0.0.0");
        let port: u16 = env.parse("PORT", 3000)?;
        let database_url = env.get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let db_max_connections: u32 = env.parse("DB_MAX_CONNECTIONS", 20)?;

        let cors_origins: Vec<String> = env
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env.parse("REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs: u64 = env.parse("SHUTDOWN_TIMEOUT_SECS", 30)?;

        let tenants = TenantRegistry::from_list(
            &env.string("TENANTS", "korean,english"),
            env.get("DEFAULT_TENANT").as_deref(),
        )?;

        let backend = match env.string("CACHE_BACKEND", "memory").to_ascii_lowercase().as_str() {
            "memory" => CacheBackend::Memory,
            "redis" => CacheBackend::Redis {
                url: env.get("REDIS_URL").ok_or(ConfigError::Missing("REDIS_URL"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "CACHE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let defaults = WriteBehindConfig::default();
        let write_behind = WriteBehindConfig {
            batch_size: env.positive("WRITE_BEHIND_BATCH_SIZE", defaults.batch_size)?,
            flush_interval: Duration::from_millis(env.positive("WRITE_BEHIND_FLUSH_MS", 1000)?),
            max_retries: env.parse("WRITE_BEHIND_MAX_RETRIES", defaults.max_retries)?,
            ..defaults
        };

        let cache = CacheConfig {
            backend,
            ttl: Duration::from_secs(env.positive("CACHE_TTL_SECS", 300)?),
            near_ttl: Duration::from_secs(env.positive("NEAR_CACHE_TTL_SECS", 30)?),
            near_max_entries: env.positive("NEAR_CACHE_MAX_ENTRIES", 1000)?,
            write_behind,
        };

        let seed_sample_data = env.parse("SEED_SAMPLE_DATA", false)?;

        Ok(Self {
            host,
            port,
            database_url,
            db_max_connections,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            tenants,
            cache,
            seed_sample_data,
        })
    }
}

/// Typed access to string key/value settings.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// A non-blank value for `key`.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        }
    }

    /// Like [`parse`](Self::parse), but zero is rejected.
    fn positive<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + Default + PartialEq + ToString,
    {
        let value = self.parse(key, default)?;
        if value == T::default() {
            return Err(ConfigError::Invalid {
                key,
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/workshop")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.tenants.default_tenant().as_str(), "korean");
        assert_eq!(config.tenants.tenants().len(), 2);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.near_ttl, Duration::from_secs(30));
        assert_eq!(config.cache.near_max_entries, 1000);
        assert_eq!(config.cache.write_behind.batch_size, 50);
        assert_eq!(config.cache.write_behind.flush_interval, Duration::from_millis(1000));
        assert_eq!(config.cache.write_behind.max_retries, 3);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/workshop"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("TENANTS", "english,korean,french"),
            ("DEFAULT_TENANT", "french"),
            ("CACHE_BACKEND", "Redis"),
            ("REDIS_URL", "redis://cache:6379"),
            ("WRITE_BEHIND_FLUSH_MS", "250"),
            ("SEED_SAMPLE_DATA", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.tenants.tenants().len(), 3);
        assert_eq!(config.tenants.default_tenant().as_str(), "french");
        assert_eq!(
            config.cache.backend,
            CacheBackend::Redis {
                url: "redis://cache:6379".into()
            }
        );
        assert_eq!(config.cache.write_behind.flush_interval, Duration::from_millis(250));
        assert!(config.seed_sample_data);
    }

    #[test]
    fn redis_backend_needs_a_url() {
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("CACHE_BACKEND", "redis")]),
            Err(ConfigError::Missing("REDIS_URL"))
        );
    }

    #[test]
    fn malformed_values_are_reported() {
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        );
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("CACHE_BACKEND", "memcached")]),
            Err(ConfigError::Invalid { key: "CACHE_BACKEND", .. })
        );
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("TENANTS", "public")]),
            Err(ConfigError::Tenants(_))
        );
    }

    #[test]
    fn zero_durations_and_sizes_are_rejected() {
        for key in [
            "WRITE_BEHIND_FLUSH_MS",
            "WRITE_BEHIND_BATCH_SIZE",
            "CACHE_TTL_SECS",
            "NEAR_CACHE_TTL_SECS",
            "NEAR_CACHE_MAX_ENTRIES",
        ] {
            assert_matches!(
                load(&[("DATABASE_URL", "postgres://db"), (key, "0")]),
                Err(ConfigError::Invalid { key: k, value }) if k == key && value == "0"
            );
        }
    }
}
