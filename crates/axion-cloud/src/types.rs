//! Wire types for the remote vault API

use serde::{Deserialize, Serialize};

/// Remote replica of a project's manifest: the sealed envelope plus the
/// server's monotonic per-project version counter. Distinct from both the
/// envelope format version and the manifest revision inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudManifest {
    /// Envelope JSON, exactly as uploaded
    pub encrypted_data: String,
    /// Server-side monotonic version
    pub version: u64,
    pub updated_at: String,
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<String>,
}

/// One entry of the remote manifest history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestHistoryEntry {
    pub version: u64,
    pub updated_at: String,
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<String>,
}

/// Body of a manifest upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub project_id: String,
    pub encrypted_data: String,
    pub key_fingerprint: String,
}

/// Response of a heartbeat pulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseResponse {
    pub token: String,
}

/// Envelope of manifest fetch/upload responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ManifestResponse {
    pub manifest: CloudManifest,
}

/// Body of a rollback request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RollbackRequest {
    pub version: u64,
}
