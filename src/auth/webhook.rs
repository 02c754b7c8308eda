//! Webhook authorization: secret lookup, caching, and signature dispatch.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::backend::{BackendError, CredentialBackend};
use super::cache::ExpiringCache;
use super::error::{AuthError, AuthErrorKind};
use super::provider::{SignatureScheme, WebhookProvider};
use super::signature;
use crate::config::AuthConfig;

/// Authorizes webhook deliveries against the shared secret configured for
/// each `(project, provider)` pair.
///
/// Secrets fetched from the backend are cached with their own TTL. The
/// optional fallback secret applies only while the backend is unavailable,
/// is never cached, and is logged on every use: it substitutes a
/// configuration value for real verification.
pub struct WebhookAuthenticator {
    backend: Option<Arc<dyn CredentialBackend>>,
    secret_cache: ExpiringCache<String, String>,
    backend_timeout: Duration,
    fallback_secret: Option<String>,
}

impl WebhookAuthenticator {
    /// Build an authenticator with the configured secret-cache TTL.
    pub fn new(backend: Option<Arc<dyn CredentialBackend>>, config: &AuthConfig) -> Self {
        Self::with_ttl(
            backend,
            config,
            Duration::from_secs(config.secret_ttl_minutes * 60),
        )
    }

    /// Build an authenticator with an explicit secret-cache TTL.
    pub fn with_ttl(
        backend: Option<Arc<dyn CredentialBackend>>,
        config: &AuthConfig,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            secret_cache: ExpiringCache::new(ttl),
            backend_timeout: Duration::from_millis(config.backend_timeout_ms),
            fallback_secret: config.insecure_fallback_secret.clone(),
        }
    }

    /// Authorize a delivery from `provider` for `project_key`.
    ///
    /// `payload` must be the exact bytes later handed to the downstream
    /// handler. GitLab deliveries compare the presented token to the secret
    /// directly; all other providers verify an HMAC over the payload.
    pub async fn authorize(
        &self,
        project_key: &str,
        provider: WebhookProvider,
        presented: &str,
        payload: &[u8],
    ) -> Result<(), AuthError> {
        let secret = self.secret_for(project_key, provider).await?;

        let verified = match provider.scheme() {
            SignatureScheme::SecretEquality => signature::verify_secret_equality(&secret, presented),
            SignatureScheme::Hmac(algorithm) => {
                signature::verify_hmac(algorithm, secret.as_bytes(), payload, presented)
            }
        };

        if !verified {
            return Err(AuthError::new(
                AuthErrorKind::SignatureMismatch,
                format!("invalid {} webhook signature", provider.name()),
            ));
        }
        Ok(())
    }

    async fn secret_for(
        &self,
        project_key: &str,
        provider: WebhookProvider,
    ) -> Result<String, AuthError> {
        let cache_key = format!("{}:{}", project_key, provider.name());
        if let Some(secret) = self.secret_cache.get(&cache_key) {
            debug!(project = project_key, source = provider.name(), "secret cache hit");
            return Ok(secret);
        }

        match self.fetch_remote(project_key, provider).await {
            Ok(secret) => {
                self.secret_cache.insert(cache_key, secret.clone());
                Ok(secret)
            }
            Err(err) if err.kind == AuthErrorKind::BackendUnavailable => {
                self.fallback_or(err, project_key, provider)
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_remote(
        &self,
        project_key: &str,
        provider: WebhookProvider,
    ) -> Result<String, AuthError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            AuthError::new(
                AuthErrorKind::BackendUnavailable,
                "credential backend not configured",
            )
        })?;

        let fetch = backend.get_webhook_secret(project_key, provider.name());
        match tokio::time::timeout(self.backend_timeout, fetch).await {
            Ok(Ok(secret)) => Ok(secret),
            Ok(Err(BackendError::Rejected(reason))) => Err(AuthError::new(
                AuthErrorKind::SecretUnavailable,
                format!("failed to retrieve webhook secret: {}", reason),
            )),
            Ok(Err(BackendError::Unavailable(reason))) => Err(AuthError::new(
                AuthErrorKind::BackendUnavailable,
                format!("failed to retrieve webhook secret: {}", reason),
            )),
            Err(_) => Err(AuthError::new(
                AuthErrorKind::BackendUnavailable,
                "webhook secret fetch timed out",
            )),
        }
    }

    /// Substitute the configured fallback secret, or surface the error.
    ///
    /// The fallback is not cached: each delivery during an outage logs a
    /// warning, and the real secret takes over once the backend answers.
    fn fallback_or(
        &self,
        err: AuthError,
        project_key: &str,
        provider: WebhookProvider,
    ) -> Result<String, AuthError> {
        match &self.fallback_secret {
            Some(secret) => {
                warn!(
                    project = project_key,
                    source = provider.name(),
                    "credential backend unavailable; verifying against the configured \
                     insecure fallback secret"
                );
                Ok(secret.clone())
            }
            None => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::backend::testing::StaticBackend;
    use crate::auth::signature::{SignatureAlgorithm, compute_hmac_hex};

    fn config() -> AuthConfig {
        AuthConfig::default()
    }

    #[tokio::test]
    async fn test_github_signature_verifies_over_payload() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "s3cr3t"));
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        let payload = br#"{"a":1}"#;
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"s3cr3t", payload);
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tampered_payload_is_rejected() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "s3cr3t"));
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"s3cr3t", br#"{"a":1}"#);
        let err = auth
            .authorize("PROJ", WebhookProvider::GitHub, &sig, br#"{"a":2}"#)
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::SignatureMismatch);
    }

    #[tokio::test]
    async fn test_gitlab_compares_secret_directly() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "gl-secret"));
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        // The raw secret verifies
        auth.authorize("PROJ", WebhookProvider::GitLab, "gl-secret", b"")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_gitlab_never_applies_hmac() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "gl-secret"));
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        // HMAC(secret, "") is not the secret; it must not verify
        let hmac_of_empty = compute_hmac_hex(SignatureAlgorithm::Sha256, b"gl-secret", b"");
        let err = auth
            .authorize("PROJ", WebhookProvider::GitLab, &hmac_of_empty, b"")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::SignatureMismatch);
    }

    #[tokio::test]
    async fn test_bitbucket_uses_sha1() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "bb-secret"));
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        let payload = b"push event";
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha1, b"bb-secret", payload);
        auth.authorize("PROJ", WebhookProvider::Bitbucket, &sig, payload)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_secret_cached_across_deliveries() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "s3cr3t"));
        let auth = WebhookAuthenticator::new(Some(backend.clone()), &config());

        let payload = b"payload";
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"s3cr3t", payload);
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
        assert_eq!(backend.secret_call_count(), 1);
    }

    #[tokio::test]
    async fn test_secret_cache_expiry_refetches() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "s3cr3t"));
        let auth = WebhookAuthenticator::with_ttl(
            Some(backend.clone()),
            &config(),
            Duration::from_millis(20),
        );

        let payload = b"payload";
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"s3cr3t", payload);
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
        assert_eq!(backend.secret_call_count(), 2);
    }

    #[tokio::test]
    async fn test_secrets_scoped_per_provider() {
        let backend = Arc::new(StaticBackend::resolving("proj-1", "s3cr3t"));
        let auth = WebhookAuthenticator::new(Some(backend.clone()), &config());

        let payload = b"payload";
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"s3cr3t", payload);
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
        auth.authorize("PROJ", WebhookProvider::Custom, &sig, payload)
            .await
            .unwrap();
        // Distinct cache keys, one backend fetch each
        assert_eq!(backend.secret_call_count(), 2);
    }

    #[tokio::test]
    async fn test_backend_down_without_fallback_fails() {
        let backend = Arc::new(StaticBackend::down());
        let auth = WebhookAuthenticator::new(Some(backend), &config());

        let err = auth
            .authorize("PROJ", WebhookProvider::GitHub, "deadbeef", b"payload")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_fallback_secret_requires_explicit_configuration() {
        // dev_mode alone must not enable the fallback
        let backend = Arc::new(StaticBackend::down());
        let cfg = AuthConfig {
            dev_mode: true,
            ..AuthConfig::default()
        };
        let auth = WebhookAuthenticator::new(Some(backend), &cfg);

        let err = auth
            .authorize("PROJ", WebhookProvider::GitHub, "deadbeef", b"payload")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_fallback_secret_verifies_when_configured() {
        let backend = Arc::new(StaticBackend::down());
        let cfg = AuthConfig {
            insecure_fallback_secret: Some("fallback-secret".to_string()),
            ..AuthConfig::default()
        };
        let auth = WebhookAuthenticator::new(Some(backend), &cfg);

        let payload = b"payload";
        let sig = compute_hmac_hex(SignatureAlgorithm::Sha256, b"fallback-secret", payload);
        auth.authorize("PROJ", WebhookProvider::GitHub, &sig, payload)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_secret_lookup_skips_fallback() {
        // Backend reachable but has no secret for the pair: definitive
        // answer, the fallback must not mask it.
        let backend = Arc::new(StaticBackend {
            project_id: Some("proj-1".to_string()),
            secret: None,
            unavailable: false,
            token_calls: std::sync::atomic::AtomicUsize::new(0),
            secret_calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let cfg = AuthConfig {
            insecure_fallback_secret: Some("fallback-secret".to_string()),
            ..AuthConfig::default()
        };
        let auth = WebhookAuthenticator::new(Some(backend), &cfg);

        let err = auth
            .authorize("PROJ", WebhookProvider::GitHub, "deadbeef", b"payload")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::SecretUnavailable);
    }
}
