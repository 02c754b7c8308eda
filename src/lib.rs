//! Rivet API server.
//!
//! The authentication and webhook-signature verification layer in front of
//! the Rivet work management API. Two guarded pipelines protect inbound
//! traffic: bearer-token authentication for ordinary API routes, and
//! multi-provider payload-signature verification for webhook routes.
//!
//! # Modules
//!
//! - [`auth`] - token validation, signature verification, caches, middleware
//! - [`gateway`] - HTTP router, shared state, downstream handlers
//! - [`config`] - YAML configuration (`config/{env}.yaml`)
//! - [`logging`] - tracing subscriber setup

pub mod auth;
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use auth::{
    AuthError, AuthErrorKind, BackendError, CredentialBackend, ExpiringCache,
    HttpCredentialBackend, RequestIdentity, TokenAuthenticator, TokenTier, WebhookAuthenticator,
    WebhookOrigin, WebhookProvider, parse_token, resolve_webhook_source,
};
pub use config::{AppConfig, AuthConfig, BackendConfig, GatewayConfig};
pub use gateway::state::AppState;
