//! Bearer token validation.
//!
//! Tokens are opaque strings with the mandatory lexical structure
//! `ri-<tier>-<id>` (e.g. `ri-prod-550e8400-e29b-41d4-a716-446655440000`).
//! The tier classifies the environment the token was issued for and decides
//! how it is resolved to a project identity.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::backend::{BackendError, CredentialBackend};
use super::cache::ExpiringCache;
use super::error::{AuthError, AuthErrorKind};
use crate::config::AuthConfig;

/// Registered token prefix.
pub const TOKEN_PREFIX: &str = "ri-";

/// Environment tier embedded in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTier {
    Dev,
    Test,
    Prod,
}

impl TokenTier {
    /// Parse the tier segment of a token. Returns `None` for unknown tiers.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "dev" => Some(Self::Dev),
            "test" => Some(Self::Test),
            "prod" => Some(Self::Prod),
            _ => None,
        }
    }

    /// Wire name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

/// A token that passed the lexical format check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub tier: TokenTier,
    /// First identifier segment (the part after the tier).
    pub id: &'a str,
    pub raw: &'a str,
}

/// Validate the lexical structure of a token.
///
/// Checks, in order: the `ri-` prefix, at least three hyphen-delimited
/// segments, a registered tier in segment two. Violations short-circuit;
/// callers must not consult caches or backends for malformed tokens.
pub fn parse_token(raw: &str) -> Result<ParsedToken<'_>, AuthError> {
    if !raw.starts_with(TOKEN_PREFIX) {
        return Err(AuthError::new(
            AuthErrorKind::MalformedToken,
            "invalid token format: must start with 'ri-'",
        ));
    }

    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() < 3 {
        return Err(AuthError::new(
            AuthErrorKind::MalformedToken,
            "invalid token format: must be ri-<tier>-<id>",
        ));
    }

    let tier = TokenTier::parse(parts[1]).ok_or_else(|| {
        AuthError::new(
            AuthErrorKind::UnsupportedTokenTier,
            format!("invalid token tier: {}", parts[1]),
        )
    })?;

    Ok(ParsedToken {
        tier,
        id: parts[2],
        raw,
    })
}

/// Validates bearer tokens and resolves them to project identities.
///
/// Resolution order: lexical check, cache lookup, tier-specific resolution,
/// cache fill. Concurrent validation of the same token may race to the
/// backend; the duplicate calls are tolerated and the cache converges on a
/// per-key replace, so no single-flight coordination is used.
pub struct TokenAuthenticator {
    backend: Option<Arc<dyn CredentialBackend>>,
    cache: ExpiringCache<String, String>,
    backend_timeout: Duration,
    dev_mode: bool,
    dev_project_id: String,
}

impl TokenAuthenticator {
    /// Build an authenticator with the configured token-cache TTL.
    pub fn new(backend: Option<Arc<dyn CredentialBackend>>, config: &AuthConfig) -> Self {
        Self::with_ttl(
            backend,
            config,
            Duration::from_secs(config.token_ttl_minutes * 60),
        )
    }

    /// Build an authenticator with an explicit token-cache TTL.
    pub fn with_ttl(
        backend: Option<Arc<dyn CredentialBackend>>,
        config: &AuthConfig,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            cache: ExpiringCache::new(ttl),
            backend_timeout: Duration::from_millis(config.backend_timeout_ms),
            dev_mode: config.dev_mode,
            dev_project_id: config.dev_project_id.clone(),
        }
    }

    /// Validate a token and return the owning project identifier.
    pub async fn validate(&self, token: &str) -> Result<String, AuthError> {
        // Lexical check first: a malformed token never reaches the cache or
        // the backend, regardless of cache state.
        let parsed = parse_token(token)?;

        if let Some(project_id) = self.cache.get(token) {
            debug!(tier = parsed.tier.as_str(), "token cache hit");
            return Ok(project_id);
        }

        let project_id = match parsed.tier {
            // Development tokens resolve locally so the server can run
            // without a live credential backend.
            TokenTier::Dev => self.dev_project_id.clone(),
            tier => self.resolve_remote(token, tier, parsed.id).await?,
        };

        self.cache
            .insert(token.to_string(), project_id.clone());
        Ok(project_id)
    }

    /// Drop a cached token binding (explicit revocation).
    pub fn revoke(&self, token: &str) {
        self.cache.remove(token);
    }

    async fn resolve_remote(
        &self,
        token: &str,
        tier: TokenTier,
        id: &str,
    ) -> Result<String, AuthError> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None if self.dev_mode => {
                // Test-environment affordance: synthesize a stable identity
                // when no backend is configured and dev mode says so.
                debug!(tier = tier.as_str(), "no credential backend; synthesizing identity");
                return Ok(format!("{}-project-{}", tier.as_str(), id));
            }
            None => {
                return Err(AuthError::new(
                    AuthErrorKind::BackendUnavailable,
                    "credential backend not configured",
                ));
            }
        };

        match tokio::time::timeout(self.backend_timeout, backend.validate_token(token)).await {
            Ok(Ok(project_id)) => Ok(project_id),
            Ok(Err(BackendError::Rejected(reason))) => Err(AuthError::new(
                AuthErrorKind::TokenRejected,
                format!("token validation failed: {}", reason),
            )),
            Ok(Err(BackendError::Unavailable(reason))) => Err(AuthError::new(
                AuthErrorKind::BackendUnavailable,
                format!("token validation failed: {}", reason),
            )),
            Err(_) => Err(AuthError::new(
                AuthErrorKind::BackendUnavailable,
                "token validation timed out",
            )),
        }
    }
}
