use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Authentication layer configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Lifetime of validated-token cache entries, in minutes.
    pub token_ttl_minutes: u64,
    /// Lifetime of webhook-secret cache entries, in minutes.
    pub secret_ttl_minutes: u64,
    /// Development mode: resolve dev-tier tokens to `dev_project_id`, and
    /// synthesize identities for test/prod tokens when no backend is
    /// configured. Does NOT enable the webhook fallback secret.
    pub dev_mode: bool,
    /// Fixed identity dev-tier tokens resolve to.
    pub dev_project_id: String,
    /// Substitute webhook secret used only while the credential backend is
    /// unavailable. Unset disables the fallback; every use is logged.
    #[serde(default)]
    pub insecure_fallback_secret: Option<String>,
    /// Upper bound on buffered webhook payload bytes.
    pub max_webhook_payload_bytes: usize,
    /// Deadline for a single credential-backend call, in milliseconds.
    pub backend_timeout_ms: u64,
    /// Credential backend endpoint. Unset means no backend (local/dev).
    #[serde(default)]
    pub backend: Option<BackendConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 60,
            secret_ttl_minutes: 60,
            dev_mode: false,
            dev_project_id: "dev-project".to_string(),
            insecure_fallback_secret: None,
            max_webhook_payload_bytes: 1024 * 1024,
            backend_timeout_ms: 5000,
            backend: None,
        }
    }
}

/// Credential backend (core service) connection settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "default_secret_endpoint")]
    pub secret_endpoint: String,
}

fn default_token_endpoint() -> String {
    "/api/auth/token/validate".to_string()
}

fn default_secret_endpoint() -> String {
    "/api/projects/webhooks/secret".to_string()
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();
        assert_eq!(auth.token_ttl_minutes, 60);
        assert_eq!(auth.secret_ttl_minutes, 60);
        assert!(!auth.dev_mode);
        assert!(auth.insecure_fallback_secret.is_none());
        assert!(auth.backend.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
log_level: "info"
log_dir: "logs"
log_file: "rivet-api.log"
use_json: false
rotation: "daily"
enable_tracing: true
gateway:
  host: "0.0.0.0"
  port: 8080
auth:
  token_ttl_minutes: 30
  secret_ttl_minutes: 15
  dev_mode: true
  dev_project_id: "dev-project"
  max_webhook_payload_bytes: 1048576
  backend_timeout_ms: 2500
  backend:
    base_url: "http://core.internal:9090"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert!(config.auth.dev_mode);
        let backend = config.auth.backend.unwrap();
        assert_eq!(backend.base_url, "http://core.internal:9090");
        // Endpoint defaults apply when omitted
        assert_eq!(backend.token_endpoint, "/api/auth/token/validate");
        assert_eq!(backend.secret_endpoint, "/api/projects/webhooks/secret");
    }

    #[test]
    fn test_auth_block_is_optional() {
        let yaml = r#"
log_level: "info"
log_dir: "logs"
log_file: "rivet-api.log"
use_json: false
rotation: "never"
enable_tracing: false
gateway:
  host: "127.0.0.1"
  port: 9000
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.auth.token_ttl_minutes, 60);
    }
}
