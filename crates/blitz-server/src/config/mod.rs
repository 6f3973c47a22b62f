//! Server config loader (strict parsing, environment overrides).
//!
//! Sources, later ones win:
//! 1. built-in defaults, or the YAML file named by `BLITZ_CONFIG`
//! 2. `PORT`, `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`

pub mod schema;

use std::fs;

use blitz_core::error::{BlitzError, Result};

pub use schema::{BlitzConfig, CorsSection, OAuthSection, ServerSection};

pub const CONFIG_PATH_ENV: &str = "BLITZ_CONFIG";
pub const PORT_ENV: &str = "PORT";
pub const OAUTH_CLIENT_ID_ENV: &str = "GITHUB_CLIENT_ID";
pub const OAUTH_CLIENT_SECRET_ENV: &str = "GITHUB_CLIENT_SECRET";

/// Load config from the process environment.
pub fn load_from_env() -> Result<BlitzConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load config using `env` as the variable lookup.
pub fn load_with<F>(env: F) -> Result<BlitzConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match non_empty(env(CONFIG_PATH_ENV)) {
        Some(path) => parse_str(&read_file(&path)?)?,
        None => BlitzConfig::default(),
    };
    apply_env(&mut cfg, &env)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<BlitzConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn read_file(path: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| BlitzError::Config(format!("read config {path} failed: {e}")))
}

fn parse_str(s: &str) -> Result<BlitzConfig> {
    serde_yaml::from_str(s).map_err(|e| BlitzError::Config(format!("invalid yaml: {e}")))
}

fn apply_env<F>(cfg: &mut BlitzConfig, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = non_empty(env(PORT_ENV)) {
        cfg.server.port = port
            .parse()
            .map_err(|_| {
                BlitzError::Config(format!("{PORT_ENV} must be a port number, got {port:?}"))
            })?;
    }
    if let Some(id) = non_empty(env(OAUTH_CLIENT_ID_ENV)) {
        cfg.oauth.client_id = id;
    }
    if let Some(secret) = non_empty(env(OAUTH_CLIENT_SECRET_ENV)) {
        cfg.oauth.client_secret = secret;
    }
    Ok(())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
