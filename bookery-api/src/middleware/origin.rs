/// Origin allow-list middleware
///
/// Browser requests (storefront and admin dashboard) must come from a
/// configured origin. Requests that carry an `Origin` header not on the
/// allow-list are rejected with 403 before they reach any handler. Requests
/// without an `Origin` header — curl, server-to-server, health probes — pass
/// through untouched.
///
/// This complements the CORS layer: CORS headers tell compliant browsers
/// what's permitted, while this layer actually refuses disallowed traffic at
/// the transport level.
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use bookery_api::middleware::origin::OriginGuardLayer;
///
/// let app: Router = Router::new()
///     .layer(OriginGuardLayer::new(vec![
///         "https://store.example.com".to_string(),
///     ]));
/// ```

use axum::{
    extract::Request,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::ApiError;

/// Origin allow-list layer
#[derive(Clone)]
pub struct OriginGuardLayer {
    /// Allowed browser origins, matched exactly against the Origin header
    allowed_origins: Arc<Vec<String>>,
}

impl OriginGuardLayer {
    /// Creates a new origin guard layer
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

impl<S> Layer<S> for OriginGuardLayer {
    type Service = OriginGuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OriginGuardMiddleware {
            inner,
            allowed_origins: Arc::clone(&self.allowed_origins),
        }
    }
}

/// Origin allow-list middleware service
#[derive(Clone)]
pub struct OriginGuardMiddleware<S> {
    inner: S,
    allowed_origins: Arc<Vec<String>>,
}

impl<S> Service<Request> for OriginGuardMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let rejected = match origin {
            // No Origin header: not a browser request, let it through
            None => None,
            Some(origin) => {
                if self.allowed_origins.iter().any(|o| o == &origin) {
                    None
                } else {
                    tracing::warn!(origin = %origin, "Rejected request from disallowed origin");
                    Some(origin)
                }
            }
        };

        if rejected.is_some() {
            return Box::pin(async move {
                Ok(ApiError::Forbidden("Origin not allowed".to_string()).into_response())
            });
        }

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(OriginGuardLayer::new(vec![
                "https://store.example.com".to_string(),
            ]))
    }

    #[tokio::test]
    async fn test_allows_request_without_origin() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allows_listed_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "https://store.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejects_unlisted_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
