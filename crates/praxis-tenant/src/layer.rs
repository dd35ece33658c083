//! Tower Layer implementation for tenant middleware.
//!
//! Provides `TenantLayer` for adding tenant context extraction to services.

use crate::config::TenantConfig;
use crate::service::TenantService;
use std::sync::Arc;
use tower_layer::Layer;

/// Tower Layer for tenant context extraction.
///
/// This layer wraps services to automatically extract and validate
/// tenant context from incoming requests.
///
/// # Example
///
/// ```rust,ignore
/// use praxis_tenant::TenantLayer;
/// use axum::Router;
///
/// let app = Router::new()
///     .route("/api/appointments", get(list_appointments))
///     .layer(TenantLayer::new());
/// ```
#[derive(Debug, Clone)]
pub struct TenantLayer {
    config: Arc<TenantConfig>,
}

impl TenantLayer {
    /// Create a new TenantLayer with default configuration.
    ///
    /// Default configuration:
    /// - Header name: "X-Tenant-Schema"
    /// - Require tenant: true
    /// - Trust header: true
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TenantConfig::default())
    }

    /// Create a new TenantLayer with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use praxis_tenant::{TenantConfig, TenantLayer};
    ///
    /// // Authenticated route tree: claims only
    /// let layer = TenantLayer::with_config(
    ///     TenantConfig::builder().trust_header(false).build(),
    /// );
    /// ```
    #[must_use]
    pub fn with_config(config: TenantConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &TenantConfig {
        &self.config
    }
}

impl Default for TenantLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for TenantLayer {
    type Service = TenantService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService::new(inner, Arc::clone(&self.config))
    }
}
