//! Error types for tenant middleware.
//!
//! Provides structured error responses for tenant-related failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use praxis_core::SchemaNameError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during tenant context extraction.
///
/// All variants are client-caused and map to HTTP 400: the tenant
/// identifier here is addressing, not authentication, so a bad one is a
/// malformed request rather than a credential failure.
///
/// # Example
///
/// ```rust
/// use praxis_tenant::TenantError;
///
/// fn handle_error(err: TenantError) {
///     match err {
///         TenantError::Missing => eprintln!("No tenant identifier provided"),
///         TenantError::Invalid(e) => eprintln!("Rejected: {}", e.reason()),
///         TenantError::Conflicting => eprintln!("Repeated tenant header"),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// No tenant identifier was found in the request.
    ///
    /// Neither an authenticated claim nor the tenant header carried an
    /// identifier.
    #[error("tenant identifier required")]
    Missing,

    /// The tenant identifier failed schema name validation.
    #[error("invalid tenant identifier: {}", .0.reason())]
    Invalid(SchemaNameError),

    /// The tenant header appeared more than once.
    ///
    /// A repeated header is a transport-layer anomaly; it is rejected
    /// rather than silently collapsed to the first value.
    #[error("conflicting tenant identifier headers")]
    Conflicting,
}

impl TenantError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Short textual reason for the response body.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            TenantError::Missing => "tenant required",
            TenantError::Invalid(err) => err.reason(),
            TenantError::Conflicting => "repeated tenant header",
        }
    }
}

impl From<SchemaNameError> for TenantError {
    fn from(err: SchemaNameError) -> Self {
        TenantError::Invalid(err)
    }
}

/// Structured JSON error response.
///
/// # Example Response
///
/// ```json
/// {
///     "error": "invalid_tenant",
///     "message": "invalid format"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable reason.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<&TenantError> for ErrorResponse {
    fn from(err: &TenantError) -> Self {
        Self::new("invalid_tenant", err.reason())
    }
}

impl TenantError {
    /// Serialize the JSON body for this error.
    ///
    /// Used by the service future, which must build the body for a generic
    /// response body type.
    #[must_use]
    pub fn body(&self) -> String {
        serde_json::to_string(&ErrorResponse::from(self)).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"Failed to serialize error"}"#.to_string()
        })
    }
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [("content-type", "application/json")],
            self.body(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_display() {
        let err = TenantError::Missing;
        assert_eq!(err.to_string(), "tenant identifier required");
    }

    #[test]
    fn test_invalid_display_uses_reason() {
        let err = TenantError::Invalid(SchemaNameError::Reserved);
        assert_eq!(err.to_string(), "invalid tenant identifier: reserved");
    }

    #[test]
    fn test_all_variants_are_bad_request() {
        assert_eq!(TenantError::Missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TenantError::Invalid(SchemaNameError::InvalidFormat).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TenantError::Conflicting.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_reasons_match_transport_contract() {
        assert_eq!(
            TenantError::Invalid(SchemaNameError::InvalidFormat).reason(),
            "invalid format"
        );
        assert_eq!(
            TenantError::Invalid(SchemaNameError::TooLong { len: 64 }).reason(),
            "too long"
        );
        assert_eq!(
            TenantError::Invalid(SchemaNameError::Reserved).reason(),
            "reserved"
        );
        assert_eq!(TenantError::Invalid(SchemaNameError::Empty).reason(), "empty");
    }

    #[test]
    fn test_body_serialization() {
        let err = TenantError::Invalid(SchemaNameError::Reserved);
        let body = err.body();
        assert!(body.contains(r#""error":"invalid_tenant""#));
        assert!(body.contains(r#""message":"reserved""#));
    }

    #[test]
    fn test_error_response_from_tenant_error() {
        let err = TenantError::Missing;
        let response = ErrorResponse::from(&err);
        assert_eq!(response.error, "invalid_tenant");
        assert_eq!(response.message, "tenant required");
    }
}
