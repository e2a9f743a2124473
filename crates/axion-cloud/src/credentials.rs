//! Credential storage and token resolution
//!
//! Interactive users authenticate out-of-band (device-code flow) and end
//! up with `~/.axion/credentials.json`. Unattended use sets `AXION_TOKEN`,
//! which short-circuits stored credentials entirely.

use serde::{Deserialize, Serialize};

use axion_core::error::{Error, Result};
use axion_core::paths;

/// Service token for unattended use.
pub const ENV_SERVICE_TOKEN: &str = "AXION_TOKEN";

/// Endpoint override.
pub const ENV_API_URL: &str = "AXION_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Contents of `~/.axion/credentials.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user: String,
    pub tokens: Tokens,
    pub api_url: String,
}

impl Credentials {
    /// Read stored credentials, or `None` when the user never logged in.
    pub fn load() -> Result<Option<Self>> {
        let path = paths::credentials_path()?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Persist credentials with owner-only permissions.
    pub fn save(&self) -> Result<()> {
        let path = paths::credentials_path()?;
        let contents = serde_json::to_vec_pretty(self)?;
        paths::write_atomic(&path, &contents, Some(0o600))?;
        Ok(())
    }
}

/// Resolve the bearer token for an authenticated request:
/// `AXION_TOKEN` first, then the stored access token.
pub fn resolve_token() -> Result<String> {
    if let Ok(token) = std::env::var(ENV_SERVICE_TOKEN) {
        if !token.is_empty() {
            return Ok(token);
        }
    }
    match Credentials::load()? {
        Some(creds) => Ok(creds.tokens.access_token),
        None => Err(Error::NotAuthenticated),
    }
}

/// Resolve the API endpoint: `AXION_API_URL` wins over the project link.
pub fn resolve_api_url(link_url: &str) -> String {
    match std::env::var(ENV_API_URL) {
        Ok(url) if !url.is_empty() => url,
        _ => link_url.to_string(),
    }
}
