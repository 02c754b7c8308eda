//! Typed request-context values injected by the authentication gateway.
//!
//! The gateway attaches these to the request's extensions; downstream
//! handlers extract them with `axum::Extension`. Typed values rather than
//! string keys, so unrelated middleware cannot collide with them.

use super::provider::WebhookProvider;

/// Identity attached to token-authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// The presented bearer token, verbatim.
    pub token: String,
    /// The project the token resolved to.
    pub project_id: String,
}

/// Origin attached to webhook-authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOrigin {
    /// The provider whose signature check admitted the delivery.
    pub provider: WebhookProvider,
}

impl WebhookOrigin {
    /// Canonical source name (`github`, `gitlab`, `bitbucket`, `custom`).
    pub fn source(&self) -> &'static str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_origin_source_name() {
        let origin = WebhookOrigin {
            provider: WebhookProvider::GitLab,
        };
        assert_eq!(origin.source(), "gitlab");
    }

    #[test]
    fn test_values_survive_extension_round_trip() {
        let mut extensions = axum::http::Extensions::new();
        extensions.insert(RequestIdentity {
            token: "ri-dev-abc".to_string(),
            project_id: "dev-project".to_string(),
        });
        let identity = extensions.get::<RequestIdentity>().unwrap();
        assert_eq!(identity.project_id, "dev-project");
    }
}
