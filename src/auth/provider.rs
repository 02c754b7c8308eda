//! Webhook provider descriptors and source resolution.
//!
//! Each supported provider carries its own signature convention (header
//! name, algorithm, prefix). A single resolver inspects the request path and
//! headers and produces the provider plus its signature material, so no call
//! site re-derives provider-specific behavior.

use axum::http::HeaderMap;

use super::error::{AuthError, AuthErrorKind};
use super::signature::SignatureAlgorithm;

/// Path prefix that routes a request onto the webhook pipeline.
pub const WEBHOOK_PATH_PREFIX: &str = "/api/v1/webhooks/";

/// Path prefix for custom webhook endpoints (`/api/v1/webhooks/custom/<id>`).
pub const CUSTOM_WEBHOOK_PREFIX: &str = "/api/v1/webhooks/custom/";

/// A webhook-sending system with its own signature convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookProvider {
    GitHub,
    GitLab,
    Bitbucket,
    Custom,
}

/// How a provider's presented signature is checked against the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// Hex-encoded HMAC over the payload.
    Hmac(SignatureAlgorithm),
    /// The presented value is compared to the stored secret directly.
    /// Used by GitLab; the value is never hashed.
    SecretEquality,
}

impl WebhookProvider {
    /// Canonical provider name, exposed to downstream handlers.
    pub fn name(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::Custom => "custom",
        }
    }

    /// Header that carries the signature material.
    pub fn signature_header(self) -> &'static str {
        match self {
            Self::GitHub => "X-Hub-Signature-256",
            Self::GitLab => "X-Gitlab-Token",
            Self::Bitbucket => "X-Hub-Signature",
            Self::Custom => "X-Webhook-Signature",
        }
    }

    /// Verification scheme for the presented signature.
    pub fn scheme(self) -> SignatureScheme {
        match self {
            Self::GitHub => SignatureScheme::Hmac(SignatureAlgorithm::Sha256),
            Self::GitLab => SignatureScheme::SecretEquality,
            Self::Bitbucket => SignatureScheme::Hmac(SignatureAlgorithm::Sha1),
            Self::Custom => SignatureScheme::Hmac(SignatureAlgorithm::Sha256),
        }
    }
}

/// Signature material extracted from an inbound webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWebhook {
    pub provider: WebhookProvider,
    /// Presented signature with any provider prefix already stripped.
    pub signature: String,
}

/// Determine which provider protocol applies and extract its signature.
///
/// Branches fail fast with a distinct reason (missing header, malformed
/// path, unsupported source) rather than a generic error.
pub fn resolve_webhook_source(path: &str, headers: &HeaderMap) -> Result<ResolvedWebhook, AuthError> {
    if path.ends_with("/github") {
        let full = required_header(headers, "X-Hub-Signature-256")?;
        // The prefix is mandatory; its absence is a validation failure,
        // not something to silently strip around.
        let signature = full.strip_prefix("sha256=").ok_or_else(|| {
            AuthError::new(
                AuthErrorKind::MissingOrMalformedSignature,
                "X-Hub-Signature-256 must start with 'sha256='",
            )
        })?;
        if header_value(headers, "X-GitHub-Event").is_none() {
            return Err(AuthError::from_kind(AuthErrorKind::MissingEventHeader));
        }
        Ok(ResolvedWebhook {
            provider: WebhookProvider::GitHub,
            signature: signature.to_string(),
        })
    } else if path.ends_with("/gitlab") {
        let token = required_header(headers, "X-Gitlab-Token")?;
        Ok(ResolvedWebhook {
            provider: WebhookProvider::GitLab,
            signature: token.to_string(),
        })
    } else if path.ends_with("/bitbucket") {
        // Expected shape: /api/v1/webhooks/bitbucket, identifying segments included
        if path.split('/').count() < 5 {
            return Err(AuthError::from_kind(AuthErrorKind::MalformedWebhookPath));
        }
        let full = required_header(headers, "X-Hub-Signature")?;
        let signature = full.strip_prefix("sha1=").ok_or_else(|| {
            AuthError::new(
                AuthErrorKind::MissingOrMalformedSignature,
                "X-Hub-Signature must start with 'sha1='",
            )
        })?;
        Ok(ResolvedWebhook {
            provider: WebhookProvider::Bitbucket,
            signature: signature.to_string(),
        })
    } else if path.starts_with(CUSTOM_WEBHOOK_PREFIX) {
        let signature = required_header(headers, "X-Webhook-Signature")?;
        Ok(ResolvedWebhook {
            provider: WebhookProvider::Custom,
            signature: signature.to_string(),
        })
    } else {
        Err(AuthError::new(
            AuthErrorKind::UnsupportedWebhookSource,
            format!("no webhook provider matches path {}", path),
        ))
    }
}

/// Non-empty header value, if present and readable as a string.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AuthError> {
    header_value(headers, name).ok_or_else(|| {
        AuthError::new(
            AuthErrorKind::MissingOrMalformedSignature,
            format!("missing {} header", name),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_resolve_github() {
        let headers = headers(&[
            ("X-Hub-Signature-256", "sha256=abc123"),
            ("X-GitHub-Event", "push"),
        ]);
        let resolved = resolve_webhook_source("/api/v1/webhooks/github", &headers).unwrap();
        assert_eq!(resolved.provider, WebhookProvider::GitHub);
        assert_eq!(resolved.signature, "abc123");
    }

    #[test]
    fn test_github_requires_sha256_prefix() {
        let headers = headers(&[
            ("X-Hub-Signature-256", "abc123"),
            ("X-GitHub-Event", "push"),
        ]);
        let err = resolve_webhook_source("/api/v1/webhooks/github", &headers).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MissingOrMalformedSignature);
    }

    #[test]
    fn test_github_requires_event_header() {
        let headers = headers(&[("X-Hub-Signature-256", "sha256=abc123")]);
        let err = resolve_webhook_source("/api/v1/webhooks/github", &headers).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MissingEventHeader);

        // An empty event header is as bad as a missing one
        let headers = headers_with_empty_event();
        let err = resolve_webhook_source("/api/v1/webhooks/github", &headers).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MissingEventHeader);
    }

    fn headers_with_empty_event() -> HeaderMap {
        headers(&[
            ("X-Hub-Signature-256", "sha256=abc123"),
            ("X-GitHub-Event", ""),
        ])
    }

    #[test]
    fn test_resolve_gitlab() {
        let headers = headers(&[("X-Gitlab-Token", "raw-secret-token")]);
        let resolved = resolve_webhook_source("/api/v1/webhooks/gitlab", &headers).unwrap();
        assert_eq!(resolved.provider, WebhookProvider::GitLab);
        assert_eq!(resolved.signature, "raw-secret-token");
        assert_eq!(resolved.provider.scheme(), SignatureScheme::SecretEquality);
    }

    #[test]
    fn test_gitlab_missing_token() {
        let err = resolve_webhook_source("/api/v1/webhooks/gitlab", &HeaderMap::new()).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MissingOrMalformedSignature);
    }

    #[test]
    fn test_resolve_bitbucket() {
        let headers = headers(&[("X-Hub-Signature", "sha1=deadbeef")]);
        let resolved = resolve_webhook_source("/api/v1/webhooks/bitbucket", &headers).unwrap();
        assert_eq!(resolved.provider, WebhookProvider::Bitbucket);
        assert_eq!(resolved.signature, "deadbeef");
    }

    #[test]
    fn test_bitbucket_short_path() {
        let headers = headers(&[("X-Hub-Signature", "sha1=deadbeef")]);
        let err = resolve_webhook_source("/webhooks/bitbucket", &headers).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MalformedWebhookPath);
    }

    #[test]
    fn test_resolve_custom() {
        let headers = headers(&[("X-Webhook-Signature", "cafef00d")]);
        let resolved =
            resolve_webhook_source("/api/v1/webhooks/custom/build-bot", &headers).unwrap();
        assert_eq!(resolved.provider, WebhookProvider::Custom);
        assert_eq!(resolved.signature, "cafef00d");
    }

    #[test]
    fn test_unsupported_source() {
        let err = resolve_webhook_source("/api/v1/webhooks/svn", &HeaderMap::new()).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::UnsupportedWebhookSource);
    }

    #[test]
    fn test_provider_conventions() {
        assert_eq!(WebhookProvider::GitHub.name(), "github");
        assert_eq!(
            WebhookProvider::GitHub.signature_header(),
            "X-Hub-Signature-256"
        );
        assert_eq!(
            WebhookProvider::Bitbucket.scheme(),
            SignatureScheme::Hmac(SignatureAlgorithm::Sha1)
        );
        assert_eq!(
            WebhookProvider::Custom.scheme(),
            SignatureScheme::Hmac(SignatureAlgorithm::Sha256)
        );
    }
}
