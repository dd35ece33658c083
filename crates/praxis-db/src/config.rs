//! Database configuration.
//!
//! One cluster serves every tenant; the host/port/credentials template below
//! is shared by all tenant connections, and only the schema (`search_path`)
//! portion varies per tenant.

use praxis_core::SchemaName;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Connection settings for the shared PostgreSQL cluster.
///
/// Values can come from a deserialized config file or from the
/// `PRAXIS_DATABASE_*` environment variables via
/// [`DatabaseConfig::from_env`].
///
/// # Example
///
/// ```rust
/// use praxis_db::DatabaseConfig;
///
/// let config = DatabaseConfig::from_env();
/// let options = config.connect_options();
/// ```
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Upper bound on pooled connections per tenant schema.
    #[serde(default = "default_max_connections_per_tenant")]
    pub max_connections_per_tenant: u32,
    /// How long a request waits for a pooled connection before failing fast.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_username() -> String {
    "praxis".to_string()
}

fn default_database() -> String {
    "praxis".to_string()
}

fn default_max_connections_per_tenant() -> u32 {
    5
}

fn default_acquire_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            database: default_database(),
            max_connections_per_tenant: default_max_connections_per_tenant(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Build a configuration from `PRAXIS_DATABASE_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// Recognized variables: `PRAXIS_DATABASE_HOST`, `PRAXIS_DATABASE_PORT`,
    /// `PRAXIS_DATABASE_USER`, `PRAXIS_DATABASE_PASSWORD`,
    /// `PRAXIS_DATABASE_NAME`, `PRAXIS_DATABASE_MAX_CONNECTIONS`,
    /// `PRAXIS_DATABASE_ACQUIRE_TIMEOUT_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("PRAXIS_DATABASE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PRAXIS_DATABASE_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(username) = std::env::var("PRAXIS_DATABASE_USER") {
            config.username = username;
        }
        if let Ok(password) = std::env::var("PRAXIS_DATABASE_PASSWORD") {
            config.password = password;
        }
        if let Ok(database) = std::env::var("PRAXIS_DATABASE_NAME") {
            config.database = database;
        }
        if let Ok(max) = std::env::var("PRAXIS_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse() {
                config.max_connections_per_tenant = max;
            }
        }
        if let Ok(timeout) = std::env::var("PRAXIS_DATABASE_ACQUIRE_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                config.acquire_timeout_ms = timeout;
            }
        }
        config
    }

    /// Connect options for the shared (public schema) pool.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }

    /// Connect options for a tenant pool: the shared template with the
    /// tenant schema as the default `search_path`.
    #[must_use]
    pub fn connect_options_for(&self, schema: &SchemaName) -> PgConnectOptions {
        self.connect_options()
            .options([("search_path", schema.as_str())])
    }
}

// Credentials must not leak into logs; Debug prints everything but the password.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field(
                "max_connections_per_tenant",
                &self.max_connections_per_tenant,
            )
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}
