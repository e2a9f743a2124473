//! Remote vault HTTP client
//!
//! Stable paths under `/projects/{id}`: manifest fetch/upload, heartbeat
//! pulse, history, rollback. Every request carries a bearer token and the
//! device audit metadata header. Only ciphertext crosses this boundary.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use axion_core::config::CloudLink;
use axion_core::device::DeviceMetadata;
use axion_core::error::{Error, Result};

use crate::credentials::{resolve_api_url, resolve_token};
use crate::types::{
    CloudManifest, ManifestHistoryEntry, ManifestResponse, PulseResponse, RollbackRequest,
    UploadRequest,
};

/// Audit metadata header name.
pub const METADATA_HEADER: &str = "X-Axion-Metadata";

/// Optional shared-beta opt-in header, taken from `AXION_BETA`.
pub const BETA_HEADER: &str = "X-Axion-Beta";

/// Heartbeat timeout; all other calls inherit the caller's deadline.
const PULSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport seam between the sync arbiter and the remote vault.
#[async_trait]
pub trait RemoteVault: Send + Sync {
    /// Fetch the current manifest record, or `None` when the project has
    /// never been pushed.
    async fn fetch_manifest(&self) -> Result<Option<CloudManifest>>;

    /// Upload a sealed envelope; returns the new record.
    async fn upload_manifest(
        &self,
        encrypted_data: &str,
        key_fingerprint: &str,
    ) -> Result<CloudManifest>;

    /// Short-timeout heartbeat.
    async fn pulse(&self) -> Result<()>;

    /// Fetch the manifest version history, newest first.
    async fn fetch_history(&self) -> Result<Vec<ManifestHistoryEntry>>;

    /// Ask the server to restore an earlier manifest version.
    async fn rollback(&self, version: u64) -> Result<()>;
}

/// reqwest-backed [`RemoteVault`] implementation.
pub struct CloudClient {
    http: reqwest::Client,
    api_url: String,
    project_id: String,
    token: String,
    cli_version: String,
}

impl CloudClient {
    /// Build a client for a linked project. Fails when no token can be
    /// resolved from `AXION_TOKEN` or stored credentials.
    pub fn new(link: &CloudLink, cli_version: &str) -> Result<Self> {
        let token = resolve_token()?;
        let api_url = resolve_api_url(&link.api_url);
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::network(e.to_string()))?;

        Ok(Self {
            http,
            api_url,
            project_id: link.project_id.clone(),
            token,
            cli_version: cli_version.to_string(),
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.project_id,
            suffix
        )
    }

    /// Attach bearer auth and the audit metadata header.
    fn decorate(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let metadata = DeviceMetadata::collect(&self.cli_version)?;
        let mut req = req
            .bearer_auth(&self.token)
            .header(METADATA_HEADER, metadata.to_header_value()?);
        if let Ok(beta) = std::env::var("AXION_BETA") {
            if !beta.is_empty() {
                req = req.header(BETA_HEADER, beta);
            }
        }
        Ok(req)
    }
}

async fn error_for(response: reqwest::Response, what: &str) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    warn!(%status, "{what} failed");
    Error::network(format!("{what}: HTTP {status}: {snippet}"))
}

#[async_trait]
impl RemoteVault for CloudClient {
    async fn fetch_manifest(&self) -> Result<Option<CloudManifest>> {
        let url = self.endpoint("manifest");
        let response = self
            .decorate(self.http.get(&url))?
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(project = %self.project_id, "no manifest on the remote yet");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_for(response, "manifest fetch").await);
        }

        let body: ManifestResponse = response
            .json()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        Ok(Some(body.manifest))
    }

    async fn upload_manifest(
        &self,
        encrypted_data: &str,
        key_fingerprint: &str,
    ) -> Result<CloudManifest> {
        let url = self.endpoint("manifest");
        let request = UploadRequest {
            project_id: self.project_id.clone(),
            encrypted_data: encrypted_data.to_string(),
            key_fingerprint: key_fingerprint.to_string(),
        };

        let response = self
            .decorate(self.http.put(&url))?
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for(response, "manifest upload").await);
        }

        let body: ManifestResponse = response
            .json()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        debug!(version = body.manifest.version, "manifest uploaded");
        Ok(body.manifest)
    }

    async fn pulse(&self) -> Result<()> {
        let url = self.endpoint("pulse");
        let response = self
            .decorate(self.http.post(&url))?
            .timeout(PULSE_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for(response, "pulse").await);
        }
        let _body: PulseResponse = response
            .json()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        Ok(())
    }

    async fn fetch_history(&self) -> Result<Vec<ManifestHistoryEntry>> {
        let url = self.endpoint("history");
        let response = self
            .decorate(self.http.get(&url))?
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for(response, "history fetch").await);
        }
        response
            .json()
            .await
            .map_err(|e| Error::network(e.to_string()))
    }

    async fn rollback(&self, version: u64) -> Result<()> {
        let url = self.endpoint("rollback");
        let response = self
            .decorate(self.http.post(&url))?
            .json(&RollbackRequest { version })
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for(response, "rollback").await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CloudClient {
        CloudClient {
            http: reqwest::Client::new(),
            api_url: "https://vault.axion.dev/".to_string(),
            project_id: "proj_42".to_string(),
            token: "tok".to_string(),
            cli_version: "0.4.2".to_string(),
        }
    }

    #[test]
    fn test_endpoint_paths_are_stable() {
        let client = test_client();
        assert_eq!(
            client.endpoint("manifest"),
            "https://vault.axion.dev/projects/proj_42/manifest"
        );
        assert_eq!(
            client.endpoint("pulse"),
            "https://vault.axion.dev/projects/proj_42/pulse"
        );
        assert_eq!(
            client.endpoint("history"),
            "https://vault.axion.dev/projects/proj_42/history"
        );
        assert_eq!(
            client.endpoint("rollback"),
            "https://vault.axion.dev/projects/proj_42/rollback"
        );
    }
}
