//! # praxis-db
//!
//! PostgreSQL layer for the Praxis multi-tenant platform.
//!
//! Every tenant's relational data lives in its own schema inside one shared
//! cluster. This crate turns a validated [`praxis_core::SchemaName`] into a
//! safe, live, pooled database handle:
//!
//! - [`registry`] - the authoritative tenant registry in the shared schema
//! - [`bootstrap`] - idempotent creation of per-schema auxiliary objects
//!   (audit enums, the activity log table, its indexes)
//! - [`pool`] - lazily-created, single-flighted connection pools keyed by
//!   schema, torn down only at process shutdown
//! - [`config`] - the cluster connection template shared by all tenants
//! - [`migrations`] - embedded migrations for the shared schema
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_core::SchemaName;
//! use praxis_db::{run_migrations, DatabaseConfig, DbPool, TenantPools};
//!
//! let config = DatabaseConfig::from_env();
//! let shared = DbPool::connect_with(&config).await?;
//! run_migrations(shared.inner()).await?;
//!
//! let pools = TenantPools::new(config, shared.inner().clone());
//!
//! // First access opens the pool, verifies the registry and bootstraps the
//! // schema; later accesses return the cached entry.
//! let schema = SchemaName::parse("acme_clinic")?;
//! let entry = pools.get(&schema).await?;
//!
//! // On shutdown, every tenant pool is closed.
//! pools.shutdown().await;
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod registry;

// Re-export main types for convenient access
pub use config::DatabaseConfig;
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::{ConnectionEntry, DbPool, PoolError, TenantPools};
pub use registry::Tenant;
