//! Configuration for tenant middleware.

/// Default header carrying the raw tenant schema name.
pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-Schema";

/// Configuration for [`TenantLayer`](crate::TenantLayer).
///
/// # Example
///
/// ```rust
/// use praxis_tenant::TenantConfig;
///
/// // Authenticated route tree: claims only, header ignored
/// let config = TenantConfig::builder()
///     .trust_header(false)
///     .build();
/// assert!(config.require_tenant);
/// ```
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// Header name to read the raw tenant identifier from.
    pub header_name: String,

    /// Whether a request without tenant context is rejected.
    ///
    /// When `false`, such requests proceed with
    /// [`TenantContext::none`](crate::TenantContext::none) - the shared
    /// (public) schema. Handlers that need a tenant must still treat a
    /// missing one as their own error, never default to a privileged schema.
    pub require_tenant: bool,

    /// Whether the tenant header is honored at all.
    ///
    /// Claims set by authentication middleware always take priority; this
    /// flag controls the pre-authentication fallback. Route trees serving
    /// authenticated traffic should disable it so a spoofed header can
    /// never influence tenant resolution.
    pub trust_header: bool,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_TENANT_HEADER.to_string(),
            require_tenant: true,
            trust_header: true,
        }
    }
}

impl TenantConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> TenantConfigBuilder {
        TenantConfigBuilder::default()
    }
}

/// Builder for [`TenantConfig`].
#[derive(Debug, Clone, Default)]
pub struct TenantConfigBuilder {
    header_name: Option<String>,
    require_tenant: Option<bool>,
    trust_header: Option<bool>,
}

impl TenantConfigBuilder {
    /// Set the header name to read the tenant identifier from.
    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    /// Set whether tenant context is required.
    #[must_use]
    pub fn require_tenant(mut self, required: bool) -> Self {
        self.require_tenant = Some(required);
        self
    }

    /// Set whether the tenant header is honored.
    #[must_use]
    pub fn trust_header(mut self, trusted: bool) -> Self {
        self.trust_header = Some(trusted);
        self
    }

    /// Build the configuration, filling unset fields with defaults.
    #[must_use]
    pub fn build(self) -> TenantConfig {
        let defaults = TenantConfig::default();
        TenantConfig {
            header_name: self.header_name.unwrap_or(defaults.header_name),
            require_tenant: self.require_tenant.unwrap_or(defaults.require_tenant),
            trust_header: self.trust_header.unwrap_or(defaults.trust_header),
        }
    }
}
