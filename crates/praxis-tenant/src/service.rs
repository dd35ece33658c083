//! Tower Service implementation for tenant middleware.
//!
//! Provides `TenantService` that wraps inner services with tenant extraction.

use crate::config::TenantConfig;
use crate::error::TenantError;
use crate::extract::{extract_schema, TenantContext};
use http::{header, HeaderValue, Method, Request, Response};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

/// Tower Service that extracts and validates tenant context.
///
/// This service wraps an inner service and:
/// 1. Extracts the tenant schema from authenticated claims or the tenant header
/// 2. Validates it as a schema name
/// 3. Inserts the `SchemaName` and `TenantContext` into request extensions
/// 4. Rejects requests with invalid tenant identifiers (HTTP 400)
///
/// # Type Parameters
///
/// * `S` - The inner service type
#[derive(Debug, Clone)]
pub struct TenantService<S> {
    inner: S,
    config: Arc<TenantConfig>,
}

impl<S> TenantService<S> {
    /// Create a new TenantService.
    pub fn new(inner: S, config: Arc<TenantConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TenantService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = TenantServiceFuture<S, ReqBody, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // Skip tenant resolution for OPTIONS requests (CORS preflight)
        if req.method() == Method::OPTIONS {
            let inner = self.inner.clone();
            let mut inner = std::mem::replace(&mut self.inner, inner);
            return TenantServiceFuture::Inner {
                future: inner.call(req),
            };
        }

        match extract_schema(&req, &self.config) {
            Ok(schema) => {
                // Insert SchemaName and TenantContext into extensions
                req.extensions_mut().insert(schema.clone());
                req.extensions_mut().insert(TenantContext::new(schema));

                let inner = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, inner);
                TenantServiceFuture::Inner {
                    future: inner.call(req),
                }
            }
            Err(TenantError::Missing) if !self.config.require_tenant => {
                // Tenant not required: proceed against the shared schema
                tracing::debug!("No tenant context, proceeding on shared schema");
                req.extensions_mut().insert(TenantContext::none());

                let inner = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, inner);
                TenantServiceFuture::Inner {
                    future: inner.call(req),
                }
            }
            Err(err) => {
                // Invalid identifiers are definitive rejections even when a
                // tenant is optional; only absence is tolerated above.
                tracing::warn!(error = %err, "Tenant context extraction failed");
                TenantServiceFuture::Error { error: Some(err) }
            }
        }
    }
}

pin_project! {
    /// Future for TenantService.
    #[project = TenantServiceFutureProj]
    pub enum TenantServiceFuture<S, ReqBody, ResBody>
    where
        S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    {
        /// Inner service future (tenant resolution succeeded or not required)
        Inner {
            #[pin]
            future: S::Future,
        },
        /// Error response (tenant resolution failed)
        Error {
            error: Option<TenantError>,
        },
    }
}

impl<S, ReqBody, ResBody> Future for TenantServiceFuture<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<String>,
{
    type Output = Result<Response<ResBody>, S::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            TenantServiceFutureProj::Inner { future } => future.poll(cx),
            TenantServiceFutureProj::Error { error } => {
                let err = error.take().unwrap_or(TenantError::Missing);
                let mut response = Response::new(ResBody::from(err.body()));
                *response.status_mut() = err.status_code();
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Poll::Ready(Ok(response))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::StatusCode;
    use praxis_core::SchemaName;
    use std::convert::Infallible;
    use tower::ServiceExt;

    // Mock service that reports which tenant context it observed
    #[derive(Clone)]
    struct MockService;

    impl Service<Request<Body>> for MockService {
        type Response = Response<Body>;
        type Error = Infallible;
        type Future = std::future::Ready<Result<Response<Body>, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let body = match req.extensions().get::<TenantContext>() {
                Some(ctx) => match ctx.schema() {
                    Some(schema) => format!("tenant:{schema}"),
                    None => "shared".to_string(),
                },
                None => "no_context".to_string(),
            };
            std::future::ready(Ok(Response::new(Body::from(body))))
        }
    }

    fn service(config: TenantConfig) -> TenantService<MockService> {
        TenantService::new(MockService, Arc::new(config))
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_header_inserts_context() {
        let req = Request::builder()
            .header("X-Tenant-Schema", "acme_clinic")
            .body(Body::empty())
            .unwrap();

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "tenant:acme_clinic");
    }

    #[tokio::test]
    async fn test_missing_header_required_is_bad_request() {
        let req = Request::builder().body(Body::empty()).unwrap();

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("invalid_tenant"));
        assert!(body.contains("tenant required"));
    }

    #[tokio::test]
    async fn test_missing_header_not_required_runs_on_shared_schema() {
        let config = TenantConfig::builder().require_tenant(false).build();
        let req = Request::builder().body(Body::empty()).unwrap();

        let response = service(config).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "shared");
    }

    #[tokio::test]
    async fn test_invalid_header_is_rejected_even_when_optional() {
        let config = TenantConfig::builder().require_tenant(false).build();
        let req = Request::builder()
            .header("X-Tenant-Schema", "Acme-Clinic")
            .body(Body::empty())
            .unwrap();

        let response = service(config).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("invalid format"));
    }

    #[tokio::test]
    async fn test_reserved_header_is_rejected() {
        let req = Request::builder()
            .header("X-Tenant-Schema", "public")
            .body(Body::empty())
            .unwrap();

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("reserved"));
    }

    #[tokio::test]
    async fn test_repeated_header_is_rejected() {
        let req = Request::builder()
            .header("X-Tenant-Schema", "acme_clinic")
            .header("X-Tenant-Schema", "rival_clinic")
            .body(Body::empty())
            .unwrap();

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("repeated tenant header"));
    }

    #[tokio::test]
    async fn test_claim_extension_overrides_header() {
        let mut req = Request::builder()
            .header("X-Tenant-Schema", "spoofed_clinic")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(SchemaName::parse("claimed_clinic").unwrap());

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "tenant:claimed_clinic");
    }

    #[tokio::test]
    async fn test_options_request_bypasses_resolution() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .body(Body::empty())
            .unwrap();

        let response = service(TenantConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "no_context");
    }
}
