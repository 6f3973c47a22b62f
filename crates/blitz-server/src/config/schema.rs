use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use blitz_core::error::{BlitzError, Result};
use serde::Deserialize;

use crate::oauth::{OAuthConfig, ProviderEndpoint, GITHUB};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlitzConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub cors: CorsSection,

    #[serde(default)]
    pub oauth: OAuthSection,
}

impl Default for BlitzConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            cors: CorsSection::default(),
            oauth: OAuthSection::default(),
        }
    }
}

impl BlitzConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BlitzError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.cors.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.parse::<IpAddr>().is_err() {
            return Err(BlitzError::Config(format!(
                "server.host must be an IP address, got {:?}",
                self.host
            )));
        }
        if !(1000..=300_000).contains(&self.shutdown_timeout_ms) {
            return Err(BlitzError::Config(
                "server.shutdown_timeout_ms must be between 1000 and 300000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| BlitzError::Config(format!("server.host: {e}")))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_shutdown_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    /// `"*"` alone allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsSection {
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            return Err(BlitzError::Config(
                "cors.allowed_origins must not be empty".into(),
            ));
        }
        if self.allows_any() {
            if self.allowed_origins.len() > 1 {
                return Err(BlitzError::Config(
                    "cors.allowed_origins: \"*\" cannot be combined with explicit origins".into(),
                ));
            }
            return Ok(());
        }
        for origin in &self.allowed_origins {
            if HeaderValue::from_str(origin).is_err() {
                return Err(BlitzError::Config(format!(
                    "cors.allowed_origins: invalid origin {origin:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

/// Identity provider client settings. Empty credentials mean "not configured".
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthSection {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: default_redirect_url(),
            scopes: default_scopes(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
        }
    }
}

impl fmt::Debug for OAuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSection")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl OAuthSection {
    /// Client configuration, if both credentials are present.
    pub fn resolve(&self) -> Option<OAuthConfig> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return None;
        }
        Some(OAuthConfig::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            ProviderEndpoint {
                auth_url: self.auth_url.clone(),
                token_url: self.token_url.clone(),
            },
            self.scopes.clone(),
            self.redirect_url.clone(),
        ))
    }
}

fn default_redirect_url() -> String {
    "http://localhost:3000/login/callback/github".into()
}
fn default_scopes() -> Vec<String> {
    vec!["user:email".into()]
}
fn default_auth_url() -> String {
    GITHUB.auth_url.into()
}
fn default_token_url() -> String {
    GITHUB.token_url.into()
}
