//! Request authentication and webhook-signature verification.
//!
//! The gateway guards two kinds of inbound traffic: ordinary API requests
//! carrying `Bearer` tokens (`ri-<tier>-<id>`), and webhook deliveries from
//! GitHub, GitLab, Bitbucket or custom senders carrying provider-specific
//! payload signatures. Validated tokens and webhook secrets are cached with
//! independent TTLs; everything else is delegated to the credential backend.

pub mod backend;
pub mod cache;
pub mod context;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod signature;
pub mod token;
pub mod webhook;

pub use backend::{BackendError, CredentialBackend, HttpCredentialBackend};
pub use cache::ExpiringCache;
pub use context::{RequestIdentity, WebhookOrigin};
pub use error::{AuthError, AuthErrorKind};
pub use middleware::{extract_bearer_token, token_auth_middleware, webhook_auth_middleware};
pub use provider::{
    CUSTOM_WEBHOOK_PREFIX, ResolvedWebhook, SignatureScheme, WEBHOOK_PATH_PREFIX, WebhookProvider,
    resolve_webhook_source,
};
pub use signature::{SignatureAlgorithm, compute_hmac_hex, verify_hmac, verify_secret_equality};
pub use token::{ParsedToken, TOKEN_PREFIX, TokenAuthenticator, TokenTier, parse_token};
pub use webhook::WebhookAuthenticator;
