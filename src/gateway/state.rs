//! Shared gateway state.

use std::sync::Arc;

use crate::auth::backend::CredentialBackend;
use crate::auth::token::TokenAuthenticator;
use crate::auth::webhook::WebhookAuthenticator;
use crate::config::AuthConfig;

/// State shared across all concurrent requests.
///
/// The authenticators own the two caches; the gateway itself is stateless
/// per request. Constructed once at startup (or per test) and handed to the
/// router, never held as a package-level global.
pub struct AppState {
    pub token_authenticator: TokenAuthenticator,
    pub webhook_authenticator: WebhookAuthenticator,
    /// Upper bound on buffered webhook payload bytes.
    pub max_webhook_payload_bytes: usize,
}

impl AppState {
    pub fn new(config: &AuthConfig, backend: Option<Arc<dyn CredentialBackend>>) -> Self {
        Self {
            token_authenticator: TokenAuthenticator::new(backend.clone(), config),
            webhook_authenticator: WebhookAuthenticator::new(backend, config),
            max_webhook_payload_bytes: config.max_webhook_payload_bytes,
        }
    }
}
