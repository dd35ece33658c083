//! Tenant registry model.
//!
//! The registry is the authoritative list of provisioned tenants, held in the
//! shared (public) schema. Every slow-path connection creation consults it -
//! deliberately uncached, so a deactivated tenant is refused on the very next
//! request.

use chrono::{DateTime, Utc};
use praxis_core::SchemaName;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A tenant in the Praxis platform.
///
/// Each tenant's relational data lives in its own PostgreSQL schema; the
/// registry row maps the human-facing name to that schema and records
/// lifecycle state.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique identifier for the tenant.
    pub id: Uuid,

    /// Human-readable name of the tenant (e.g., "Acme Clinic").
    pub name: String,

    /// The tenant's schema name. Unique across all tenants; always a value
    /// that passed `SchemaName` validation at provisioning time.
    pub schema_name: String,

    /// Timestamp when the tenant was created.
    pub created_at: DateTime<Utc>,

    /// Timestamp when the tenant was deactivated. NULL means active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,

    /// Reason for deactivation (admin-facing, not shown to end users).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivation_reason: Option<String>,
}

impl Tenant {
    /// Returns `true` if this tenant is currently active.
    ///
    /// Deactivated tenants are refused new database connections.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Finds a tenant by its ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, schema_name, created_at, deactivated_at, deactivation_reason
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Finds a tenant by its schema name.
    pub async fn find_by_schema(
        pool: &PgPool,
        schema: &SchemaName,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, schema_name, created_at, deactivated_at, deactivation_reason
            FROM tenants
            WHERE schema_name = $1
            "#,
        )
        .bind(schema.as_str())
        .fetch_optional(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Check whether an active tenant is registered for a schema name.
    ///
    /// This is the registry check that guards connection creation: a
    /// syntactically valid schema name that was never provisioned (or has
    /// been deactivated) must not get a connection.
    pub async fn exists_active(pool: &PgPool, schema: &SchemaName) -> Result<bool, DbError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tenants
                WHERE schema_name = $1 AND deactivated_at IS NULL
            )
            "#,
        )
        .bind(schema.as_str())
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.0)
    }

    /// Register a new tenant.
    ///
    /// The schema name has already passed validation by construction; the
    /// unique constraint on `schema_name` is the last line of defense against
    /// double provisioning.
    pub async fn create(pool: &PgPool, name: &str, schema: &SchemaName) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO tenants (name, schema_name)
            VALUES ($1, $2)
            RETURNING id, name, schema_name, created_at, deactivated_at, deactivation_reason
            "#,
        )
        .bind(name)
        .bind(schema.as_str())
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Deactivate a tenant, refusing it new connections.
    ///
    /// Returns the updated tenant on success.
    pub async fn deactivate(pool: &PgPool, id: Uuid, reason: &str) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE tenants
            SET deactivated_at = NOW(), deactivation_reason = $2
            WHERE id = $1
            RETURNING id, name, schema_name, created_at, deactivated_at, deactivation_reason
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Reactivate a deactivated tenant.
    ///
    /// Returns the updated tenant on success.
    pub async fn reactivate(pool: &PgPool, id: Uuid) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE tenants
            SET deactivated_at = NULL, deactivation_reason = NULL
            WHERE id = $1
            RETURNING id, name, schema_name, created_at, deactivated_at, deactivation_reason
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Lists all tenants.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, schema_name, created_at, deactivated_at, deactivation_reason
            FROM tenants
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Lists active tenants only.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, schema_name, created_at, deactivated_at, deactivation_reason
            FROM tenants
            WHERE deactivated_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }
}
