//! Identity service client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::header::AUTHENTICATION_HEADER;

/// Body of `GET /verify-token`
///
/// Carries a verdict only. The identity service never says why a token was
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

/// Something that can judge a token on behalf of a downstream service
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CheckResponse, GatewayError>;
}

/// Identity client configuration
#[derive(Clone, Debug)]
pub struct IdentityClientConfig {
    /// Base URL of the identity service
    pub url: String,
    pub connect_timeout: Duration,
    /// Bound on the whole request, body included
    pub request_timeout: Duration,
}

impl IdentityClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the identity service's verify endpoint
///
/// No retries: a failed call is a rejection, never a second attempt.
pub struct IdentityClient {
    verify_url: String,
    client: Client,
}

impl IdentityClient {
    /// Create a new identity client
    pub fn new(config: IdentityClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        let verify_url = format!("{}/verify-token", config.url.trim_end_matches('/'));

        info!("Created identity client for {}", config.url);

        Ok(Self { verify_url, client })
    }
}

#[async_trait]
impl TokenVerifier for IdentityClient {
    async fn verify(&self, token: &str) -> Result<CheckResponse, GatewayError> {
        debug!("Verifying token against {}", self.verify_url);

        let response = self
            .client
            .get(&self.verify_url)
            .header(AUTHENTICATION_HEADER, token)
            .send()
            .await
            .map_err(|e| {
                warn!("Identity service request failed: {}", e);
                GatewayError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Identity service returned {}", status);
            return Err(GatewayError::UpstreamUnavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        response.json::<CheckResponse>().await.map_err(|e| {
            warn!("Identity service returned an unreadable body: {}", e);
            GatewayError::UpstreamUnavailable(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::get};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> IdentityClient {
        IdentityClient::new(IdentityClientConfig::new(format!("http://{}/", addr))).unwrap()
    }

    async fn echo_check(headers: HeaderMap) -> Json<CheckResponse> {
        let token = headers
            .get(AUTHENTICATION_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        Json(CheckResponse {
            valid: token == "good-token",
            subject: (token == "good-token").then(|| "alice".to_string()),
            admin: false,
        })
    }

    #[tokio::test]
    async fn test_verify_forwards_credential() {
        let addr = serve(Router::new().route("/verify-token", get(echo_check))).await;
        let client = client_for(addr);

        let check = client.verify("good-token").await.unwrap();
        assert!(check.valid);
        assert_eq!(check.subject.as_deref(), Some("alice"));

        let check = client.verify("bad-token").await.unwrap();
        assert_eq!(check, CheckResponse::default());
    }

    #[tokio::test]
    async fn test_connection_refused_is_upstream_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client_for(addr).verify("good-token").await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let router = Router::new().route(
            "/verify-token",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let addr = serve(router).await;

        let result = client_for(addr).verify("good-token").await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unreadable_body_is_upstream_error() {
        let router = Router::new().route("/verify-token", get(|| async { "I'm up!" }));
        let addr = serve(router).await;

        let result = client_for(addr).verify("good-token").await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_identity_service_times_out() {
        let router = Router::new().route(
            "/verify-token",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(CheckResponse {
                    valid: true,
                    subject: Some("alice".to_string()),
                    admin: true,
                })
            }),
        );
        let addr = serve(router).await;

        let mut config = IdentityClientConfig::new(format!("http://{}", addr));
        config.request_timeout = Duration::from_millis(200);
        let client = IdentityClient::new(config).unwrap();

        let result = client.verify("good-token").await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[test]
    fn test_check_response_wire_format() {
        let invalid = serde_json::to_value(CheckResponse::default()).unwrap();
        assert_eq!(invalid, serde_json::json!({ "valid": false, "admin": false }));

        let parsed: CheckResponse =
            serde_json::from_str(r#"{"valid":true,"subject":"alice"}"#).unwrap();
        assert!(parsed.valid);
        assert!(!parsed.admin);
    }
}
