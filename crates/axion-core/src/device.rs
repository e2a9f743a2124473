//! Device identity and audit metadata
//!
//! Each machine gets one random UUID, persisted under `~/.axion/device-id`
//! and cached for the process lifetime. The audit metadata envelope adds
//! host facts and a fresh timestamp per request; it carries no personally
//! identifying information.

use std::sync::OnceLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::paths;

static DEVICE_ID: OnceLock<String> = OnceLock::new();

/// The persistent device identifier, generating one on first use.
///
/// A missing or malformed file is replaced with a fresh identifier.
pub fn device_id() -> Result<String> {
    if let Some(id) = DEVICE_ID.get() {
        return Ok(id.clone());
    }
    let id = load_or_create()?;
    // A racing initialiser may have won; the stored value is canonical.
    Ok(DEVICE_ID.get_or_init(|| id).clone())
}

fn load_or_create() -> Result<String> {
    let path = paths::device_id_path()?;

    if let Ok(raw) = std::fs::read_to_string(&path) {
        let trimmed = raw.trim();
        if Uuid::parse_str(trimmed).is_ok() {
            return Ok(trimmed.to_string());
        }
        debug!("device-id file is malformed, regenerating");
    }

    let id = Uuid::new_v4().to_string();
    paths::write_atomic(&path, id.as_bytes(), Some(0o600))?;
    Ok(id)
}

/// Audit metadata attached to every authenticated cloud request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub device_id: String,
    pub hostname: String,
    pub platform: String,
    pub arch: String,
    pub os_release: String,
    pub runtime: String,
    pub cli_version: String,
    /// RFC 3339 UTC timestamp, fresh per request
    pub timestamp: String,
}

impl DeviceMetadata {
    /// Collect the metadata envelope for one request.
    pub fn collect(cli_version: &str) -> Result<Self> {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            device_id: device_id()?,
            hostname,
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            os_release: sysinfo::System::os_version().unwrap_or_else(|| "unknown".to_string()),
            runtime: env!("AXION_RUSTC_VERSION").to_string(),
            cli_version: cli_version.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Serialise for the `X-Axion-Metadata` header.
    pub fn to_header_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_is_stable_within_process() {
        let first = device_id().unwrap();
        let second = device_id().unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_metadata_has_fresh_timestamp_and_no_empty_fields() {
        let meta = DeviceMetadata::collect("0.4.2").unwrap();
        assert!(!meta.hostname.is_empty());
        assert!(!meta.platform.is_empty());
        assert!(!meta.arch.is_empty());
        assert_eq!(meta.cli_version, "0.4.2");
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.timestamp).is_ok());
    }

    #[test]
    fn test_header_value_is_json() {
        let meta = DeviceMetadata::collect("0.4.2").unwrap();
        let header = meta.to_header_value().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&header).unwrap();
        assert_eq!(parsed["cliVersion"], "0.4.2");
        assert!(parsed.get("deviceId").is_some());
    }
}
