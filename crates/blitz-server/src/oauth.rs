//! OAuth client configuration for the external identity provider.
//!
//! Only the configuration value lives here. No login flow is served yet; the
//! value is built at startup and held by [`AppState`](crate::app_state::AppState)
//! so a future handler can pick it up.

use std::fmt;

/// Well-known provider endpoints.
pub struct Provider {
    pub auth_url: &'static str,
    pub token_url: &'static str,
}

pub const GITHUB: Provider = Provider {
    auth_url: "https://github.com/login/oauth/authorize",
    token_url: "https://github.com/login/oauth/access_token",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub auth_url: String,
    pub token_url: String,
}

/// Immutable after startup. The secret is kept out of `Debug` output.
#[derive(Clone)]
pub struct OAuthConfig {
    client_id: String,
    client_secret: String,
    endpoint: ProviderEndpoint,
    scopes: Vec<String>,
    redirect_url: String,
}

impl OAuthConfig {
    pub fn new(
        client_id: String,
        client_secret: String,
        endpoint: ProviderEndpoint,
        scopes: Vec<String>,
        redirect_url: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            endpoint,
            scopes,
            redirect_url,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("scopes", &self.scopes)
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}
