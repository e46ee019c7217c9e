//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::client::TokenVerifier;
use crate::error::GatewayError;
use crate::header::credential_from_headers;

/// Identity attached to a request after successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub subject: String,
    pub is_admin: bool,
}

/// Authentication middleware
///
/// Rejects the request before any handler runs unless exactly one non-empty
/// `Authentication` header is present and the identity service accepts it.
/// Verification failures of any kind fail closed.
pub async fn require_auth(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = credential_from_headers(request.headers())
        .ok_or(GatewayError::Unauthenticated)?
        .to_string();

    let check = verifier.verify(&token).await?;
    if !check.valid {
        debug!("Identity service rejected credential");
        return Err(GatewayError::Unauthenticated);
    }

    let subject = check
        .subject
        .filter(|s| !s.is_empty())
        .ok_or(GatewayError::Unauthenticated)?;

    let identity = AuthenticatedIdentity {
        subject,
        is_admin: check.admin,
    };

    debug!(
        "Authenticated subject: {} (admin: {})",
        identity.subject, identity.is_admin
    );

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Middleware to require the admin flag
///
/// Must run inside [`require_auth`]. Anything short of an explicit admin
/// verdict is refused.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, GatewayError> {
    let identity = request
        .extensions()
        .get::<AuthenticatedIdentity>()
        .ok_or(GatewayError::Unauthenticated)?;

    if !identity.is_admin {
        debug!("Subject {} is not an admin", identity.subject);
        return Err(GatewayError::Unauthorized);
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(GatewayError::Unauthenticated)
    }
}

/// Extractor for admin identity (required)
pub struct RequireAdmin(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = AuthenticatedIdentity::from_request_parts(parts, state).await?;

        if !identity.is_admin {
            return Err(GatewayError::Unauthorized);
        }

        Ok(RequireAdmin(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CheckResponse;
    use crate::header::AUTHENTICATION_HEADER;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Accepts `user-token` and `admin-token`; `down` simulates an outage
    struct StubVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, token: &str) -> Result<CheckResponse, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                "user-token" => Ok(CheckResponse {
                    valid: true,
                    subject: Some("alice".to_string()),
                    admin: false,
                }),
                "admin-token" => Ok(CheckResponse {
                    valid: true,
                    subject: Some("root".to_string()),
                    admin: true,
                }),
                "down" => Err(GatewayError::UpstreamUnavailable("connection refused".to_string())),
                _ => Ok(CheckResponse::default()),
            }
        }
    }

    struct Harness {
        app: Router,
        verifier: Arc<StubVerifier>,
        handler_calls: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let verifier = Arc::new(StubVerifier {
            calls: AtomicUsize::new(0),
        });
        let handler_calls = Arc::new(AtomicUsize::new(0));

        let cart_calls = handler_calls.clone();
        let admin_calls = handler_calls.clone();
        let extractor_calls = handler_calls.clone();

        let admin = Router::new()
            .route(
                "/articles",
                post(move || {
                    let calls = admin_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "created"
                    }
                }),
            )
            .route_layer(middleware::from_fn(require_admin));

        let app = Router::new()
            .route(
                "/cart",
                get(move |identity: AuthenticatedIdentity| {
                    let calls = cart_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        identity.subject
                    }
                }),
            )
            .route(
                "/categories",
                post(move |RequireAdmin(identity): RequireAdmin| {
                    let calls = extractor_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        identity.subject
                    }
                }),
            )
            .merge(admin)
            .route_layer(middleware::from_fn_with_state(
                verifier.clone() as Arc<dyn TokenVerifier>,
                require_auth,
            ));

        Harness {
            app,
            verifier,
            handler_calls,
        }
    }

    fn request(method: &str, uri: &str, tokens: &[&str]) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        for token in tokens {
            builder = builder.header(AUTHENTICATION_HEADER, *token);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_rejected_before_handler() {
        let h = harness();
        let response = h.app.oneshot(request("GET", "/cart", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_header_rejected_before_handler() {
        let h = harness();
        let response = h
            .app
            .oneshot(request("GET", "/cart", &["user-token", "user-token"]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_header_rejected() {
        let h = harness();
        let response = h.app.oneshot(request("GET", "/cart", &[""])).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let h = harness();
        let response = h
            .app
            .oneshot(request("GET", "/cart", &["forged"]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_outage_fails_closed() {
        let h = harness();
        let response = h.app.oneshot(request("GET", "/cart", &["down"])).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);

        // Same body as any other authentication failure
        let body = body_string(response).await;
        assert!(!body.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let h = harness();
        let response = h
            .app
            .oneshot(request("GET", "/cart", &["Bearer user-token"]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice");
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_admin_route_rejects_non_admin() {
        let h = harness();
        let response = h
            .app
            .oneshot(request("POST", "/articles", &["user-token"]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_admin_route_accepts_admin() {
        let h = harness();
        let response = h
            .app
            .oneshot(request("POST", "/articles", &["admin-token"]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.handler_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_admin_route_requires_authentication_first() {
        let h = harness();
        let response = h.app.oneshot(request("POST", "/articles", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_admin_extractor() {
        let h = harness();
        let response = h
            .app
            .clone()
            .oneshot(request("POST", "/categories", &["user-token"]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = h
            .app
            .oneshot(request("POST", "/categories", &["admin-token"]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "root");
    }
}
