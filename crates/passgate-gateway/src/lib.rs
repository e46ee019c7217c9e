//! Passgate Verification Gateway
//!
//! Request interception for downstream services. The gateway holds no
//! secrets and no revocation state: it forwards the caller's credential to
//! the identity service's `/verify-token` endpoint and either rejects the
//! request or attaches an [`AuthenticatedIdentity`] to it.
//!
//! ```ignore
//! let verifier: Arc<dyn TokenVerifier> = Arc::new(IdentityClient::new(config)?);
//!
//! let admin = Router::new()
//!     .route("/articles", post(create_article))
//!     .route_layer(middleware::from_fn(require_admin));
//!
//! let app = Router::new()
//!     .route("/cart", get(get_cart))
//!     .merge(admin)
//!     .route_layer(middleware::from_fn_with_state(verifier, require_auth));
//! ```

pub mod client;
pub mod error;
pub mod header;
pub mod middleware;

pub use client::{CheckResponse, IdentityClient, IdentityClientConfig, TokenVerifier};
pub use error::GatewayError;
pub use header::{AUTHENTICATION_HEADER, credential_from_headers};
pub use middleware::{AuthenticatedIdentity, RequireAdmin, require_admin, require_auth};
