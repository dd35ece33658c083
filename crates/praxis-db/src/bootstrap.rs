//! Tenant Schema Bootstrap
//!
//! Idempotently ensures the auxiliary objects every tenant schema needs
//! before normal use: the audit enum types, the activity log table, and its
//! indexes. Safe to run repeatedly across process restarts, and safe to run
//! concurrently for the same schema because the connection pool manager
//! single-flights creation per schema.
//!
//! There is no metadata table tracking what has been applied; each run
//! re-checks existence in the catalog. PostgreSQL has no `CREATE TYPE IF NOT
//! EXISTS`, so enum creation goes through a `DO $$` block guarded by a
//! `pg_type`/`pg_namespace` lookup scoped to the target schema.
//!
//! All identifiers are schema-qualified through [`SchemaName::quoted`]; the
//! schema name inside the catalog predicate is additionally escaped as a SQL
//! string literal.

use praxis_core::SchemaName;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::DbError;

/// Name of the per-tenant audit table.
pub const AUDIT_TABLE: &str = "activity_log";

/// Enum types required in every tenant schema, with their variants.
pub const REQUIRED_ENUMS: &[(&str, &[&str])] = &[
    ("audit_event", &["create", "update", "delete"]),
    ("actor_kind", &["user", "service", "system"]),
];

/// Indexes required on the audit table: (index name, column).
const AUDIT_INDEXES: &[(&str, &str)] = &[
    ("activity_log_item_id_idx", "item_id"),
    ("activity_log_actor_id_idx", "actor_id"),
];

/// Escape a string for embedding as a SQL literal.
///
/// Validated schema names cannot contain quotes, but generated DDL must never
/// rely on that at a distance; every literal goes through here.
fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// DDL for one guarded enum creation.
fn create_enum_sql(schema: &SchemaName, name: &str, variants: &[&str]) -> String {
    let variant_list = variants
        .iter()
        .map(|v| format!("'{}'", sql_literal(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "DO $$ BEGIN\n\
         IF NOT EXISTS (\n\
           SELECT 1 FROM pg_type t\n\
           JOIN pg_namespace n ON n.oid = t.typnamespace\n\
           WHERE t.typname = '{typ}' AND n.nspname = '{nsp}'\n\
         ) THEN\n\
           CREATE TYPE {schema}.{name} AS ENUM ({variants});\n\
         END IF;\n\
         END $$",
        typ = sql_literal(name),
        nsp = sql_literal(schema.as_str()),
        schema = schema.quoted(),
        name = name,
        variants = variant_list,
    )
}

/// DDL for the audit table.
fn create_audit_table_sql(schema: &SchemaName) -> String {
    let schema = schema.quoted();
    format!(
        r#"CREATE TABLE IF NOT EXISTS {schema}.{AUDIT_TABLE} (
            id                 UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            item_id            UUID NOT NULL,
            item_type          VARCHAR(128) NOT NULL,
            event              {schema}.audit_event NOT NULL,
            actor_id           UUID,
            actor_kind         {schema}.actor_kind NOT NULL DEFAULT 'user',
            object_changes     JSONB NOT NULL DEFAULT '{{}}',
            request_id         VARCHAR(64),
            request_ip         VARCHAR(64),
            request_user_agent TEXT,
            created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#
    )
}

/// DDL for one audit table index.
fn create_index_sql(schema: &SchemaName, index: &str, column: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {index} ON {schema}.{AUDIT_TABLE} ({column})",
        schema = schema.quoted(),
    )
}

/// Ensure a tenant schema holds every required auxiliary object.
///
/// Runs against a pool whose `search_path` may or may not point at the
/// schema - all statements are fully qualified, so either works. Any DDL
/// error aborts the entire run and surfaces as [`DbError::BootstrapFailed`];
/// the caller must not mark the schema initialized, so the next access
/// retries from scratch.
///
/// # Errors
///
/// Returns `DbError::BootstrapFailed` if any statement fails.
#[instrument(skip(pool), fields(schema = %schema))]
pub async fn ensure_bootstrapped(pool: &PgPool, schema: &SchemaName) -> Result<(), DbError> {
    info!(schema = %schema, "bootstrap.started: ensuring tenant schema objects");

    // A registered tenant whose schema went missing heals here instead of
    // failing every request until manual intervention.
    sqlx::raw_sql(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted()))
        .execute(pool)
        .await
        .map_err(DbError::BootstrapFailed)?;

    for (name, variants) in REQUIRED_ENUMS {
        sqlx::raw_sql(&create_enum_sql(schema, name, variants))
            .execute(pool)
            .await
            .map_err(DbError::BootstrapFailed)?;
    }

    sqlx::raw_sql(&create_audit_table_sql(schema))
        .execute(pool)
        .await
        .map_err(DbError::BootstrapFailed)?;

    for (index, column) in AUDIT_INDEXES {
        sqlx::raw_sql(&create_index_sql(schema, index, column))
            .execute(pool)
            .await
            .map_err(DbError::BootstrapFailed)?;
    }

    info!(schema = %schema, "bootstrap.completed: tenant schema objects ready");
    Ok(())
}
