//! # praxis-tenant
//!
//! Tower/Axum middleware for multi-tenant context extraction and validation.
//!
//! This library is the request boundary adapter of the Praxis platform: it
//! turns the raw tenant signal on an incoming HTTP request into a validated
//! [`praxis_core::SchemaName`] and carries it through the request as a
//! [`TenantContext`] in request extensions.
//!
//! ## Features
//!
//! - **Claim Extraction**: An authenticated principal's schema (inserted
//!   into request extensions by auth middleware) always wins; tenant headers
//!   on such requests are ignored
//! - **Header Extraction**: Pre-authentication flows read the
//!   `X-Tenant-Schema` header, when the route tree opts in
//! - **Validation**: Every identifier passes `SchemaName::parse` before it
//!   is trusted; repeated headers are rejected
//! - **Error Responses**: Failures are HTTP 400 with a structured JSON body
//!   naming the reason (`invalid format`, `too long`, `reserved`, `empty`)
//! - **Composability**: Standard Tower Layer/Service for middleware composition
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{routing::get, Extension, Router};
//! use praxis_tenant::{TenantContext, TenantLayer};
//!
//! async fn list_appointments(Extension(ctx): Extension<TenantContext>) -> String {
//!     match ctx.schema() {
//!         Some(schema) => format!("Appointments for {schema}"),
//!         None => "No tenant in scope".to_string(),
//!     }
//! }
//!
//! let app: Router = Router::new()
//!     .route("/api/appointments", get(list_appointments))
//!     .layer(TenantLayer::new());
//! ```
//!
//! ## Database Integration with praxis-db
//!
//! The context pairs with `praxis_db::TenantPools` to reach the tenant's
//! isolated connection pool:
//!
//! ```rust,ignore
//! use axum::{extract::State, http::StatusCode, Extension};
//! use praxis_db::TenantPools;
//! use praxis_tenant::TenantContext;
//!
//! async fn count_activity(
//!     Extension(ctx): Extension<TenantContext>,
//!     State(pools): State<TenantPools>,
//! ) -> Result<String, StatusCode> {
//!     let schema = ctx.schema().ok_or(StatusCode::BAD_REQUEST)?;
//!     let entry = pools
//!         .get(schema)
//!         .await
//!         .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
//!     let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_log")
//!         .fetch_one(entry.pool())
//!         .await
//!         .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
//!     Ok(count.0.to_string())
//! }
//! ```
//!
//! ## Custom Configuration
//!
//! ```rust
//! use praxis_tenant::{TenantConfig, TenantLayer};
//!
//! // Authenticated route tree: never honor the header
//! let layer = TenantLayer::with_config(
//!     TenantConfig::builder().trust_header(false).build(),
//! );
//!
//! // Public route tree: tenant optional, requests may run on the shared schema
//! let layer = TenantLayer::with_config(
//!     TenantConfig::builder().require_tenant(false).build(),
//! );
//! ```

mod config;
mod error;
mod extract;
mod layer;
mod service;

pub use config::{TenantConfig, TenantConfigBuilder, DEFAULT_TENANT_HEADER};
pub use error::{ErrorResponse, TenantError};
pub use extract::{extract_from_header, extract_schema, TenantContext};
pub use layer::TenantLayer;
pub use service::TenantService;
