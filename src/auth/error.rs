//! Authentication error types.
//!
//! Provides structured error kinds for token and webhook authentication
//! failures, with their HTTP status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Authentication failure kinds (4101-4113).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AuthErrorKind {
    /// 4101: Token does not match the `ri-<tier>-<id>` format
    MalformedToken = 4101,
    /// 4102: Token tier is not one of dev/test/prod
    UnsupportedTokenTier = 4102,
    /// 4103: Credential backend could not be reached
    BackendUnavailable = 4103,
    /// 4104: Credential backend rejected the token
    TokenRejected = 4104,
    /// 4105: Authorization header missing or not a Bearer token
    MissingAuthHeader = 4105,
    /// 4106: Webhook request without a project key
    MissingProjectKey = 4106,
    /// 4107: Request path matches no known webhook provider
    UnsupportedWebhookSource = 4107,
    /// 4108: Signature header missing or malformed
    MissingOrMalformedSignature = 4108,
    /// 4109: GitHub event header missing or empty
    MissingEventHeader = 4109,
    /// 4110: Webhook path is structurally invalid for the provider
    MalformedWebhookPath = 4110,
    /// 4111: Request body could not be buffered
    BodyUnreadable = 4111,
    /// 4112: Signature verification failed
    SignatureMismatch = 4112,
    /// 4113: No webhook secret available for the project/source pair
    SecretUnavailable = 4113,
}

impl AuthErrorKind {
    /// Get error code as i32.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get error name string.
    pub fn name(self) -> &'static str {
        match self {
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::UnsupportedTokenTier => "UNSUPPORTED_TOKEN_TIER",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::TokenRejected => "TOKEN_REJECTED",
            Self::MissingAuthHeader => "MISSING_AUTH_HEADER",
            Self::MissingProjectKey => "MISSING_PROJECT_KEY",
            Self::UnsupportedWebhookSource => "UNSUPPORTED_WEBHOOK_SOURCE",
            Self::MissingOrMalformedSignature => "MISSING_OR_MALFORMED_SIGNATURE",
            Self::MissingEventHeader => "MISSING_EVENT_HEADER",
            Self::MalformedWebhookPath => "MALFORMED_WEBHOOK_PATH",
            Self::BodyUnreadable => "BODY_UNREADABLE",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::SecretUnavailable => "SECRET_UNAVAILABLE",
        }
    }

    /// Get HTTP status code.
    ///
    /// Malformed-request kinds map to 400, everything else to 401.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::MissingProjectKey
            | Self::UnsupportedWebhookSource
            | Self::MissingEventHeader
            | Self::MalformedWebhookPath
            | Self::BodyUnreadable => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Authentication error with message.
///
/// Every rejection is terminal for the current request; the gateway never
/// retries internally.
#[derive(Debug, Clone)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    /// Create a new auth error.
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create error with default message.
    pub fn from_kind(kind: AuthErrorKind) -> Self {
        let message = match kind {
            AuthErrorKind::MalformedToken => "Token must match ri-<tier>-<id>",
            AuthErrorKind::UnsupportedTokenTier => "Token tier must be dev, test or prod",
            AuthErrorKind::BackendUnavailable => "Credential backend unavailable",
            AuthErrorKind::TokenRejected => "Token rejected by credential backend",
            AuthErrorKind::MissingAuthHeader => "Authorization header required",
            AuthErrorKind::MissingProjectKey => "Project key is required",
            AuthErrorKind::UnsupportedWebhookSource => "Unsupported webhook source",
            AuthErrorKind::MissingOrMalformedSignature => "Invalid or missing signature",
            AuthErrorKind::MissingEventHeader => "Missing event type",
            AuthErrorKind::MalformedWebhookPath => "Invalid webhook URL",
            AuthErrorKind::BodyUnreadable => "Failed to read request body",
            AuthErrorKind::SignatureMismatch => "Invalid webhook signature",
            AuthErrorKind::SecretUnavailable => "No webhook secret configured",
        };
        Self::new(kind, message)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for AuthError {}

/// JSON response body for auth errors.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub code: i32,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            code: self.kind.code(),
            error: self.kind.name(),
            message: self.message,
        };
        (self.kind.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthErrorKind::MalformedToken.code(), 4101);
        assert_eq!(AuthErrorKind::SecretUnavailable.code(), 4113);
    }

    #[test]
    fn test_error_names() {
        assert_eq!(AuthErrorKind::MalformedToken.name(), "MALFORMED_TOKEN");
        assert_eq!(
            AuthErrorKind::SignatureMismatch.name(),
            "SIGNATURE_MISMATCH"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            AuthErrorKind::MissingAuthHeader.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthErrorKind::SignatureMismatch.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthErrorKind::MissingProjectKey.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthErrorKind::UnsupportedWebhookSource.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthErrorKind::MissingEventHeader.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_from_kind() {
        let err = AuthError::from_kind(AuthErrorKind::MissingProjectKey);
        assert_eq!(err.kind, AuthErrorKind::MissingProjectKey);
        assert!(err.message.contains("Project key"));
    }
}
