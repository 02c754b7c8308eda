//! Authentication gateway middleware.
//!
//! Two guarded pipelines composed onto the router:
//!
//! - the token pipeline authenticates every ordinary API route with a
//!   `Bearer` token;
//! - the webhook pipeline authenticates webhook routes by verifying the
//!   provider's payload signature.
//!
//! Each pipeline decides for itself whether it applies to a request, so
//! both are layered onto the whole router. A rejection is terminal for the
//! request; the gateway never retries.

use axum::{
    body::{Body, to_bytes},
    extract::{Query, State},
    http::{Method, Request, header},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::context::{RequestIdentity, WebhookOrigin};
use super::error::{AuthError, AuthErrorKind};
use super::provider::{WEBHOOK_PATH_PREFIX, resolve_webhook_source};
use crate::gateway::state::AppState;

/// Extract the bearer token from the `Authorization` header.
pub fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AuthError::new(AuthErrorKind::MissingAuthHeader, "Authorization header required")
        })?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::new(
            AuthErrorKind::MissingAuthHeader,
            "Authorization header must be a Bearer token",
        )
    })
}

/// Token pipeline: bearer-token authentication for ordinary API routes.
///
/// Skips `OPTIONS` preflight requests and webhook paths (those are guarded
/// by [`webhook_auth_middleware`]). On success the request gains a
/// [`RequestIdentity`] extension.
pub async fn token_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // CORS preflight passes through untouched
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    // Webhook endpoints authenticate by signature, not by token
    if request.uri().path().starts_with(WEBHOOK_PATH_PREFIX) {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())?.to_string();
    let project_id = state.token_authenticator.validate(&token).await?;

    debug!(project = %project_id, "request authenticated");
    request
        .extensions_mut()
        .insert(RequestIdentity { token, project_id });
    Ok(next.run(request).await)
}

/// Webhook pipeline: signature verification for webhook routes.
///
/// Buffers the request body once (bounded by the configured payload cap)
/// and restores it, so the downstream handler reads exactly the bytes the
/// signature was verified over. On success the request gains a
/// [`WebhookOrigin`] extension.
pub async fn webhook_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // CORS preflight passes through untouched
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    if !request.uri().path().starts_with(WEBHOOK_PATH_PREFIX) {
        return Ok(next.run(request).await);
    }

    // Step 1: tenant key, before any secret lookup happens
    let project_key = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|query| query.0.get("project").cloned())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            AuthError::new(AuthErrorKind::MissingProjectKey, "project key is required")
        })?;

    // Step 2: buffer the payload and restore it for the downstream handler
    let (parts, body) = request.into_parts();
    let payload = to_bytes(body, state.max_webhook_payload_bytes)
        .await
        .map_err(|e| {
            AuthError::new(
                AuthErrorKind::BodyUnreadable,
                format!("failed to read request body: {}", e),
            )
        })?;
    let mut request = Request::from_parts(parts, Body::from(payload.clone()));

    // Step 3: which provider protocol applies, and its signature material
    let resolved = resolve_webhook_source(request.uri().path(), request.headers())?;

    // Step 4: secret lookup + signature verification over the buffered bytes
    state
        .webhook_authenticator
        .authorize(
            &project_key,
            resolved.provider,
            &resolved.signature,
            &payload,
        )
        .await?;

    debug!(
        project = %project_key,
        source = resolved.provider.name(),
        bytes = payload.len(),
        "webhook authenticated"
    );
    request.extensions_mut().insert(WebhookOrigin {
        provider: resolved.provider,
    });
    Ok(next.run(request).await)
}
