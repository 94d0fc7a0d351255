//! Process settings read from the environment (and `.env`, when present).

use crate::error::ConfigError;
use crate::security::Principal;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "RESOURCE_SDK_";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub schema_path: PathBuf,
    /// Package roots scanned for resources; empty means every package.
    pub scan_packages: Vec<String>,
    pub bind: SocketAddr,
    /// Bearer token -> principal.
    pub tokens: HashMap<String, Principal>,
    pub body_limit: usize,
    /// Where synthesized artifact descriptions are written, if anywhere.
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("schema.json"),
            scan_packages: Vec::new(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            tokens: HashMap::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            artifacts_dir: None,
        }
    }
}

impl Settings {
    /// Load `.env` then read `RESOURCE_SDK_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(path) = var("SCHEMA") {
            settings.schema_path = PathBuf::from(path);
        }
        if let Some(packages) = var("SCAN_PACKAGES") {
            settings.scan_packages = packages
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(bind) = var("BIND") {
            settings.bind = bind
                .parse()
                .map_err(|_| ConfigError::Load(format!("{}BIND: invalid address '{}'", ENV_PREFIX, bind)))?;
        }
        if let Some(tokens) = var("TOKENS") {
            settings.tokens = serde_json::from_str(&tokens)
                .map_err(|e| ConfigError::Load(format!("{}TOKENS: {}", ENV_PREFIX, e)))?;
        }
        if let Some(limit) = var("BODY_LIMIT") {
            settings.body_limit = limit
                .parse()
                .map_err(|_| ConfigError::Load(format!("{}BODY_LIMIT: not a byte count '{}'", ENV_PREFIX, limit)))?;
        }
        settings.artifacts_dir = var("ARTIFACTS_DIR").map(PathBuf::from);
        Ok(settings)
    }
}
