//! Database migration management.
//!
//! Provides functions to run and manage versioned SQL migrations for the
//! shared (public) schema. Tenant schemas are not migrated this way - their
//! baseline objects come from the bootstrap applier.

use crate::error::DbError;
use sqlx::PgPool;

/// Run all pending public-schema migrations.
///
/// Migrations are embedded at compile time from the `migrations/` directory.
/// Each migration is run in order based on its filename prefix (0001_, 0002_, etc.).
///
/// # Example
///
/// ```rust,ignore
/// use praxis_db::{run_migrations, DbPool};
///
/// let pool = DbPool::connect("postgres://localhost/praxis").await?;
/// run_migrations(pool.inner()).await?;
/// ```
///
/// # Errors
///
/// Returns `DbError::MigrationFailed` if any migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}
