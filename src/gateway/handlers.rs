//! Downstream request handlers.
//!
//! The domain services behind the gateway live elsewhere; the handlers here
//! are the thin consumers of the authenticated request context: liveness,
//! identity echo, and webhook acknowledgement.

use axum::{
    Extension, Json,
    body::Bytes,
    http::StatusCode,
};
use serde::Serialize;

use crate::auth::context::{RequestIdentity, WebhookOrigin};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/v1/health
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub token: String,
    pub project_id: String,
}

/// GET /api/v1/auth/identity
///
/// Echoes the identity the token pipeline attached to the request.
pub async fn get_identity(
    Extension(identity): Extension<RequestIdentity>,
) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        token: identity.token,
        project_id: identity.project_id,
    })
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub source: &'static str,
    pub received_bytes: usize,
}

/// POST /api/v1/webhooks/{github,gitlab,bitbucket,custom/{id}}
///
/// Acknowledges an authenticated delivery. The body read here is the same
/// buffer the signature was verified over.
pub async fn receive_webhook(
    Extension(origin): Extension<WebhookOrigin>,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    tracing::info!(
        source = origin.source(),
        bytes = body.len(),
        "webhook delivery accepted"
    );
    (
        StatusCode::OK,
        Json(WebhookAck {
            source: origin.source(),
            received_bytes: body.len(),
        }),
    )
}
