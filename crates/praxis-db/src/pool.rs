//! Connection pooling for the shared cluster and for tenant schemas.
//!
//! Two layers live here:
//!
//! - [`DbPool`] - a thin wrapper over the shared (public schema) `PgPool`,
//!   used for the tenant registry and migrations.
//! - [`TenantPools`] - the per-tenant pool manager. It owns the map of
//!   schema name to live pooled connection, lazily creates pools on first
//!   access, single-flights concurrent creation per schema, and tears
//!   everything down on process shutdown.
//!
//! The schema-to-entry map and the schema-to-guard map are the only shared
//! mutable state in the subsystem. Both are private to [`TenantPools`];
//! nothing else can mutate them.

use chrono::{DateTime, Utc};
use praxis_core::SchemaName;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::bootstrap::ensure_bootstrapped;
use crate::config::DatabaseConfig;
use crate::error::DbError;
use crate::registry::Tenant;

/// Default connection cap for the shared pool.
const DEFAULT_SHARED_MAX_CONNECTIONS: u32 = 5;

// ============================================================================
// Shared pool wrapper
// ============================================================================

/// Connection pool for the shared (public) schema.
///
/// # Example
///
/// ```rust,ignore
/// use praxis_db::{run_migrations, DbPool};
///
/// let pool = DbPool::connect("postgres://localhost/praxis").await?;
/// run_migrations(pool.inner()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Connect using a database URL.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the URL is invalid or the
    /// server is unreachable.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let options = PgConnectOptions::from_str(url).map_err(DbError::ConnectionFailed)?;
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_SHARED_MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(DbError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Connect using a [`DatabaseConfig`].
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the server is unreachable.
    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_SHARED_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(config.connect_options())
            .await
            .map_err(DbError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Access the underlying `PgPool`.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if no connection can be acquired.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        self.pool.begin().await.map_err(DbError::ConnectionFailed)
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// ============================================================================
// Tenant pool manager
// ============================================================================

/// Errors surfaced by [`TenantPools::get`].
///
/// `Clone` on purpose: one slow-path failure is fanned out to every caller
/// that was waiting on the same in-flight creation.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// Opening the tenant's connection pool failed.
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    /// The tenant schema's bootstrap DDL failed.
    #[error("schema bootstrap failed: {0}")]
    BootstrapFailed(String),

    /// The registry lookup itself failed (database unreachable, etc).
    #[error("tenant registry lookup failed: {0}")]
    Registry(String),

    /// No active tenant is registered for the schema name.
    ///
    /// Distinct from [`PoolError::Registry`]: this is "no such tenant",
    /// not "database unreachable".
    #[error("no active tenant registered for schema {0}")]
    UnknownTenant(String),

    /// The manager is tearing down; no new connections are handed out.
    #[error("tenant connection manager is shutting down")]
    ShuttingDown,
}

impl From<DbError> for PoolError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(e) => PoolError::ConnectionFailed(e.to_string()),
            DbError::BootstrapFailed(e) => PoolError::BootstrapFailed(e.to_string()),
            DbError::NotFound(what) => PoolError::UnknownTenant(what),
            other => PoolError::Registry(other.to_string()),
        }
    }
}

/// A live, initialized connection pool for one tenant schema.
///
/// Created on first access to the schema and destroyed only at process-wide
/// shutdown; there is no idle eviction because the tenant set is small and
/// long-lived, not cache-sized.
#[derive(Debug)]
pub struct ConnectionEntry {
    schema: SchemaName,
    pool: PgPool,
    created_at: DateTime<Utc>,
    last_used_at: RwLock<DateTime<Utc>>,
}

impl ConnectionEntry {
    fn new(schema: SchemaName, pool: PgPool) -> Self {
        let now = Utc::now();
        Self {
            schema,
            pool,
            created_at: now,
            last_used_at: RwLock::new(now),
        }
    }

    /// The schema this entry serves.
    #[must_use]
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }

    /// The tenant's connection pool.
    ///
    /// The pool (not a single physical connection) backs the entry, so
    /// concurrent query execution within one tenant does not serialize.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// When this entry was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When this entry was last handed out by [`TenantPools::get`].
    pub async fn last_used_at(&self) -> DateTime<Utc> {
        *self.last_used_at.read().await
    }

    async fn touch(&self) {
        *self.last_used_at.write().await = Utc::now();
    }
}

/// Result of one creation attempt, broadcast to every waiter.
type InitResult = Result<Arc<ConnectionEntry>, PoolError>;

/// The in-flight guard: a receiver that resolves once creation finishes.
type InitGuard = watch::Receiver<Option<InitResult>>;

struct Shared {
    config: DatabaseConfig,
    registry: PgPool,
    /// schema -> live entry. Published entries are fully initialized.
    entries: RwLock<HashMap<SchemaName, Arc<ConnectionEntry>>>,
    /// schema -> in-flight creation. At most one guard per schema exists at
    /// any instant; it is removed when creation finishes, success or failure.
    inflight: Mutex<HashMap<SchemaName, InitGuard>>,
    shutting_down: AtomicBool,
}

/// Lazily-created, single-flighted connection pools, one per tenant schema.
///
/// # Example
///
/// ```rust,ignore
/// use praxis_core::SchemaName;
/// use praxis_db::{DatabaseConfig, DbPool, TenantPools};
///
/// let config = DatabaseConfig::from_env();
/// let shared = DbPool::connect_with(&config).await?;
/// let pools = TenantPools::new(config, shared.inner().clone());
///
/// let schema = SchemaName::parse("acme_clinic")?;
/// let entry = pools.get(&schema).await?;
/// let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_log")
///     .fetch_one(entry.pool())
///     .await?;
/// ```
///
/// # Concurrency
///
/// `get` guarantees at most one connection-creation-and-bootstrap sequence
/// per schema even under a burst of concurrent callers: the first caller
/// installs an in-flight guard and spawns the creation task; everyone else
/// awaits the same guard and receives the same result. Creation runs on its
/// own task, so a caller that gives up waiting (client disconnect) never
/// cancels initialization for the others.
#[derive(Clone)]
pub struct TenantPools {
    inner: Arc<Shared>,
}

impl TenantPools {
    /// Create a manager over the given cluster configuration.
    ///
    /// `registry` is the shared (public schema) pool used for tenant
    /// registry checks.
    #[must_use]
    pub fn new(config: DatabaseConfig, registry: PgPool) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                registry,
                entries: RwLock::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// The shared pool used for registry lookups.
    #[must_use]
    pub fn registry(&self) -> &PgPool {
        &self.inner.registry
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Number of live tenant pools.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    /// Whether any tenant pool is live.
    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Schemas with a live pool.
    pub async fn schemas(&self) -> Vec<SchemaName> {
        self.inner.entries.read().await.keys().cloned().collect()
    }

    /// Get the connection entry for a tenant schema, creating it on first
    /// access.
    ///
    /// Fast path: a published entry is returned straight from the map.
    /// Slow path: the caller either installs the in-flight guard (spawning
    /// the creation task) or awaits a guard another caller installed; both
    /// receive the identical result.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ShuttingDown`] once shutdown has begun
    /// - [`PoolError::UnknownTenant`] if no active tenant is registered
    /// - [`PoolError::ConnectionFailed`] / [`PoolError::BootstrapFailed`] /
    ///   [`PoolError::Registry`] from the failed creation attempt; the same
    ///   value is observed by every waiting caller
    #[instrument(skip(self), fields(schema = %schema))]
    pub async fn get(&self, schema: &SchemaName) -> Result<Arc<ConnectionEntry>, PoolError> {
        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }

        if let Some(entry) = self.inner.entries.read().await.get(schema) {
            entry.touch().await;
            return Ok(Arc::clone(entry));
        }

        // Slow path: join an existing in-flight creation or start a new one.
        let mut guard = {
            let mut inflight = self.inner.inflight.lock().await;

            // Re-check under the guard lock: creation may have completed
            // between our fast-path read and acquiring this lock.
            if let Some(entry) = self.inner.entries.read().await.get(schema) {
                entry.touch().await;
                return Ok(Arc::clone(entry));
            }
            if self.is_shutting_down() {
                return Err(PoolError::ShuttingDown);
            }

            match inflight.get(schema) {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(schema.clone(), rx.clone());
                    self.spawn_creation(schema.clone(), tx);
                    rx
                }
            }
        };

        // Wait for the creation task to broadcast its result. Waiters hold
        // their own receiver clone, so guard-map cleanup cannot strand them.
        let result = match guard.wait_for(|value| value.is_some()).await {
            Ok(value) => match value.clone() {
                Some(result) => result,
                None => Err(PoolError::ShuttingDown),
            },
            // Sender dropped without publishing: only happens when the
            // runtime is torn down mid-creation.
            Err(_) => Err(PoolError::ShuttingDown),
        };
        result
    }

    /// Run creation on a detached task so caller cancellation cannot poison
    /// initialization for other waiters.
    fn spawn_creation(&self, schema: SchemaName, tx: watch::Sender<Option<InitResult>>) {
        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = match Shared::create_entry(&shared, &schema).await {
                Ok(entry) => {
                    // Publish under the entries lock, gated on the shutdown
                    // flag: either shutdown sees the entry and closes it, or
                    // we see the flag and never publish.
                    let mut entries = shared.entries.write().await;
                    if shared.shutting_down.load(Ordering::SeqCst) {
                        drop(entries);
                        entry.pool.close().await;
                        warn!(
                            schema = %schema,
                            "pool.create.aborted: shutdown began during creation"
                        );
                        Err(PoolError::ShuttingDown)
                    } else {
                        entries.insert(schema.clone(), Arc::clone(&entry));
                        Ok(entry)
                    }
                }
                Err(err) => {
                    warn!(schema = %schema, error = %err, "pool.create.failed");
                    Err(err)
                }
            };

            // Remove the guard unconditionally so a failed attempt can be
            // retried by a later caller, then wake every waiter.
            shared.inflight.lock().await.remove(&schema);
            tx.send_replace(Some(result));
        });
    }
}

impl Shared {
    /// The creation sequence run under the in-flight guard: registry check,
    /// pool open, bootstrap.
    async fn create_entry(shared: &Arc<Shared>, schema: &SchemaName) -> InitResult {
        info!(schema = %schema, "pool.create.started: first access to tenant schema");

        // Uncached registry check: a deactivated tenant must be refused on
        // its very next connection attempt.
        let registered = Tenant::exists_active(&shared.registry, schema)
            .await
            .map_err(PoolError::from)?;
        if !registered {
            return Err(PoolError::UnknownTenant(schema.to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(shared.config.max_connections_per_tenant)
            .acquire_timeout(Duration::from_millis(shared.config.acquire_timeout_ms))
            .connect_with(shared.config.connect_options_for(schema))
            .await
            .map_err(|e| PoolError::ConnectionFailed(e.to_string()))?;

        if let Err(err) = ensure_bootstrapped(&pool, schema).await {
            pool.close().await;
            return Err(PoolError::from(err));
        }

        info!(schema = %schema, "pool.create.ready: tenant pool initialized");
        Ok(Arc::new(ConnectionEntry::new(schema.clone(), pool)))
    }
}

impl TenantPools {
    /// Process-wide teardown.
    ///
    /// Flips the shutdown flag (new callers fail fast with
    /// [`PoolError::ShuttingDown`]), abandons pending guards - their
    /// creation tasks observe the flag and resolve every waiter with a
    /// definitive result - then closes each published pool in turn.
    /// Best-effort and idempotent: a second call returns immediately.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("pool.shutdown.started: tearing down tenant connection pools");

        let pending: Vec<SchemaName> = {
            let mut inflight = self.inner.inflight.lock().await;
            inflight.drain().map(|(schema, _)| schema).collect()
        };
        if !pending.is_empty() {
            info!(
                count = pending.len(),
                "pool.shutdown.pending: in-flight creations will resolve as shutting down"
            );
        }

        let entries: Vec<Arc<ConnectionEntry>> = {
            let mut entries = self.inner.entries.write().await;
            entries.drain().map(|(_, entry)| entry).collect()
        };
        for entry in entries {
            info!(schema = %entry.schema(), "pool.shutdown.closing: closing tenant pool");
            entry.pool.close().await;
        }

        info!("pool.shutdown.completed: all tenant pools closed");
    }
}
