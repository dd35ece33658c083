//! Praxis Core Library
//!
//! Shared types for the Praxis multi-tenant platform.
//!
//! # Modules
//!
//! - [`schema`] - The validated tenant schema identifier ([`SchemaName`])
//!   and its validation error taxonomy ([`SchemaNameError`])
//!
//! # Example
//!
//! ```
//! use praxis_core::{SchemaName, SchemaNameError};
//!
//! // Raw input is normalized (trimmed, lowercased) before validation
//! let schema = SchemaName::parse("  Acme_Clinic  ").unwrap();
//! assert_eq!(schema.as_str(), "acme_clinic");
//!
//! // Reserved namespaces can never become tenant schemas
//! assert_eq!(SchemaName::parse("public"), Err(SchemaNameError::Reserved));
//! ```

pub mod schema;

// Re-export main types for convenient access
pub use schema::{SchemaName, SchemaNameError};
