//! HTTP gateway: router wiring and server startup.

pub mod handlers;
pub mod state;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::auth::backend::CredentialBackend;
use crate::auth::middleware::{token_auth_middleware, webhook_auth_middleware};
use crate::config::AppConfig;
use state::AppState;

/// Build the API router with both authentication pipelines layered on.
///
/// The layers wrap every request, including unmatched paths, so a request
/// to an unknown webhook source is rejected by the resolver (400) rather
/// than falling through to a bare 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    let webhook_routes = Router::new()
        .route("/github", post(handlers::receive_webhook))
        .route("/gitlab", post(handlers::receive_webhook))
        .route("/bitbucket", post(handlers::receive_webhook))
        .route("/custom/{id}", post(handlers::receive_webhook));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/auth/identity", get(handlers::get_identity))
        .nest("/api/v1/webhooks", webhook_routes)
        .layer(from_fn_with_state(state.clone(), webhook_auth_middleware))
        .layer(from_fn_with_state(state, token_auth_middleware))
}

/// Bind the configured address and serve until shutdown.
pub async fn start_server(
    config: AppConfig,
    backend: Option<Arc<dyn CredentialBackend>>,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(&config.auth, backend));
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            anyhow::bail!(
                "failed to bind to {}: {}. Port {} may already be in use.",
                addr,
                e,
                config.gateway.port
            );
        }
    };

    println!("🚀 Rivet API listening on http://{}", addr);
    println!("   build: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    println!("🔒 API routes require Authorization: Bearer ri-<tier>-<id>");
    println!("🪝 Webhooks: /api/v1/webhooks/{{github,gitlab,bitbucket,custom/<id>}}?project=<key>");

    axum::serve(listener, app).await?;
    Ok(())
}
