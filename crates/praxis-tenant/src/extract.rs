//! Tenant context extraction from HTTP requests.
//!
//! Provides the per-request context value and the functions that derive it
//! from authenticated claims or the tenant header.

use crate::config::TenantConfig;
use crate::error::TenantError;
use http::Request;
use praxis_core::SchemaName;

/// Per-request tenant context.
///
/// Inserted into request extensions once at the start of request handling
/// and readable by any code executing within that request, however many
/// asynchronous hops downstream - request extensions are scoped to exactly
/// one request, so concurrent requests on shared infrastructure can never
/// observe each other's value.
///
/// Only the middleware constructs this; business logic reads it.
///
/// # Example
///
/// ```rust,ignore
/// use axum::Extension;
/// use praxis_tenant::TenantContext;
///
/// async fn handler(Extension(ctx): Extension<TenantContext>) -> String {
///     match ctx.schema() {
///         Some(schema) => format!("Tenant: {schema}"),
///         None => "Shared schema request".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    schema: Option<SchemaName>,
}

impl TenantContext {
    /// Context for a tenant-scoped request.
    #[must_use]
    pub fn new(schema: SchemaName) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    /// Context for a request outside any tenant (shared/public schema).
    ///
    /// Callers that need a tenant and find none must treat that as their
    /// own error condition, not silently fall back to a privileged schema.
    #[must_use]
    pub fn none() -> Self {
        Self { schema: None }
    }

    /// The active tenant schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaName> {
        self.schema.as_ref()
    }

    /// Whether this request runs in a tenant schema.
    #[must_use]
    pub fn is_tenant(&self) -> bool {
        self.schema.is_some()
    }
}

impl From<SchemaName> for TenantContext {
    fn from(schema: SchemaName) -> Self {
        Self::new(schema)
    }
}

/// Extract the tenant schema from an HTTP request.
///
/// Resolution order:
///
/// 1. A `SchemaName` already present in request extensions. Authentication
///    middleware puts the credential-embedded schema there; once such a
///    claim exists, any tenant header on the request is ignored outright
///    (defense against header spoofing past a trusted credential).
/// 2. The configured tenant header, only when `config.trust_header` is set
///    (pre-authentication flows such as registration).
///
/// # Errors
///
/// Returns [`TenantError::Missing`] when no identifier is found,
/// [`TenantError::Conflicting`] when the header is repeated, and
/// [`TenantError::Invalid`] when the value fails validation.
pub fn extract_schema<B>(
    req: &Request<B>,
    config: &TenantConfig,
) -> Result<SchemaName, TenantError> {
    if let Some(schema) = req.extensions().get::<SchemaName>() {
        return Ok(schema.clone());
    }

    if config.trust_header {
        extract_from_header(req, &config.header_name)
    } else {
        Err(TenantError::Missing)
    }
}

/// Extract and validate the tenant schema from an HTTP header.
///
/// # Errors
///
/// Returns `TenantError::Missing` if the header is absent,
/// `TenantError::Conflicting` if it appears more than once, and
/// `TenantError::Invalid` if the single value fails schema name validation.
pub fn extract_from_header<B>(
    req: &Request<B>,
    header_name: &str,
) -> Result<SchemaName, TenantError> {
    let mut values = req.headers().get_all(header_name).iter();
    let value = values.next().ok_or(TenantError::Missing)?;
    if values.next().is_some() {
        return Err(TenantError::Conflicting);
    }

    let raw = value
        .to_str()
        .map_err(|_| TenantError::Invalid(praxis_core::SchemaNameError::InvalidFormat))?;

    SchemaName::parse(raw).map_err(TenantError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::SchemaNameError;

    const HEADER: &str = "X-Tenant-Schema";

    fn request_with_header(value: &str) -> Request<()> {
        Request::builder().header(HEADER, value).body(()).unwrap()
    }

    fn bare_request() -> Request<()> {
        Request::builder().body(()).unwrap()
    }

    #[test]
    fn test_extract_from_header_valid() {
        let req = request_with_header("acme_clinic");
        let schema = extract_from_header(&req, HEADER).unwrap();
        assert_eq!(schema.as_str(), "acme_clinic");
    }

    #[test]
    fn test_extract_from_header_normalizes() {
        let req = request_with_header("  Acme_Clinic  ");
        let schema = extract_from_header(&req, HEADER).unwrap();
        assert_eq!(schema.as_str(), "acme_clinic");
    }

    #[test]
    fn test_extract_from_header_missing() {
        let req = bare_request();
        assert_eq!(
            extract_from_header(&req, HEADER),
            Err(TenantError::Missing)
        );
    }

    #[test]
    fn test_extract_from_header_empty_value() {
        let req = request_with_header("");
        assert_eq!(
            extract_from_header(&req, HEADER),
            Err(TenantError::Invalid(SchemaNameError::Empty))
        );
    }

    #[test]
    fn test_extract_from_header_invalid_value() {
        let req = request_with_header("Acme-Clinic");
        assert_eq!(
            extract_from_header(&req, HEADER),
            Err(TenantError::Invalid(SchemaNameError::InvalidFormat))
        );
    }

    #[test]
    fn test_extract_from_header_reserved_value() {
        let req = request_with_header("public");
        assert_eq!(
            extract_from_header(&req, HEADER),
            Err(TenantError::Invalid(SchemaNameError::Reserved))
        );
    }

    #[test]
    fn test_extract_from_header_repeated_is_conflicting() {
        let req = Request::builder()
            .header(HEADER, "acme_clinic")
            .header(HEADER, "other_clinic")
            .body(())
            .unwrap();
        assert_eq!(
            extract_from_header(&req, HEADER),
            Err(TenantError::Conflicting)
        );
    }

    #[test]
    fn test_extract_schema_prefers_claim_extension() {
        let claim = SchemaName::parse("claimed_clinic").unwrap();
        let mut req = request_with_header("spoofed_clinic");
        req.extensions_mut().insert(claim.clone());

        let schema = extract_schema(&req, &TenantConfig::default()).unwrap();
        assert_eq!(schema, claim);
    }

    #[test]
    fn test_extract_schema_claim_wins_even_over_invalid_header() {
        let claim = SchemaName::parse("claimed_clinic").unwrap();
        let mut req = request_with_header("NOT VALID!");
        req.extensions_mut().insert(claim.clone());

        // The header is ignored outright, not validated
        let schema = extract_schema(&req, &TenantConfig::default()).unwrap();
        assert_eq!(schema, claim);
    }

    #[test]
    fn test_extract_schema_header_ignored_when_untrusted() {
        let req = request_with_header("acme_clinic");
        let config = TenantConfig::builder().trust_header(false).build();
        assert_eq!(extract_schema(&req, &config), Err(TenantError::Missing));
    }

    #[test]
    fn test_extract_schema_custom_header_name() {
        let req = Request::builder()
            .header("X-Clinic", "acme_clinic")
            .body(())
            .unwrap();
        let config = TenantConfig::builder().header_name("X-Clinic").build();
        let schema = extract_schema(&req, &config).unwrap();
        assert_eq!(schema.as_str(), "acme_clinic");
    }

    #[test]
    fn test_tenant_context_accessors() {
        let schema = SchemaName::parse("acme_clinic").unwrap();
        let ctx = TenantContext::new(schema.clone());
        assert!(ctx.is_tenant());
        assert_eq!(ctx.schema(), Some(&schema));

        let none = TenantContext::none();
        assert!(!none.is_tenant());
        assert_eq!(none.schema(), None);

        let from: TenantContext = schema.clone().into();
        assert_eq!(from, ctx);
    }
}
