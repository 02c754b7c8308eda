//! Rivet API server entry point.
//!
//! Loads `config/{env}.yaml`, initializes logging, connects the credential
//! backend if one is configured, and serves the authentication gateway.

use std::sync::Arc;
use std::time::Duration;

use rivet_api::auth::backend::{CredentialBackend, HttpCredentialBackend};
use rivet_api::config::AppConfig;
use rivet_api::gateway;
use rivet_api::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env = %env, "starting rivet_api");

    let backend: Option<Arc<dyn CredentialBackend>> = match &config.auth.backend {
        Some(backend_config) => {
            tracing::info!(base_url = %backend_config.base_url, "using HTTP credential backend");
            Some(Arc::new(HttpCredentialBackend::new(
                backend_config,
                Duration::from_millis(config.auth.backend_timeout_ms),
            )?))
        }
        None => {
            tracing::warn!(
                dev_mode = config.auth.dev_mode,
                "no credential backend configured; only dev-tier tokens will validate"
            );
            None
        }
    };

    gateway::start_server(config, backend).await
}
