//! Encrypted manifest persistence
//!
//! The manifest lives on disk only as a sealed envelope. Saving stages the
//! new ciphertext in a temporary sibling and renames it into place, so a
//! crashed save never leaves a half-written file.

use tokio::fs;
use tracing::debug;

use axion_core::envelope::{Envelope, KdfParams};
use axion_core::error::Result;
use axion_core::keystore::ProjectKey;
use axion_core::paths::{self, ProjectPaths};

use crate::manifest::Manifest;

/// Loads and saves the ciphertext manifest file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    paths: ProjectPaths,
    kdf_params: KdfParams,
}

impl ManifestStore {
    pub fn new(paths: ProjectPaths) -> Self {
        Self {
            paths,
            kdf_params: KdfParams::default(),
        }
    }

    /// Override the KDF cost (tests use weak parameters).
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Read and decrypt the manifest. `None` when no ciphertext exists yet
    /// (initialised but never saved).
    pub async fn load(&self, key: &ProjectKey) -> Result<Option<Manifest>> {
        let path = self.paths.manifest_path();
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope = Envelope::from_bytes(&raw)?;
        let plaintext = envelope.open(key.as_hex())?;
        Ok(Some(Manifest::from_bytes(&plaintext)?))
    }

    /// Seal and write the manifest; returns the envelope JSON that was
    /// written (the exact bytes a cloud push uploads).
    pub async fn save(&self, manifest: &Manifest, key: &ProjectKey) -> Result<String> {
        self.paths.ensure_dir()?;

        let plaintext = manifest.to_bytes()?;
        let envelope = Envelope::seal_with_params(&plaintext, key.as_hex(), self.kdf_params.clone())?;
        let json = serde_json::to_string(&envelope)?;

        paths::write_atomic(&self.paths.manifest_path(), json.as_bytes(), Some(0o644))?;
        debug!(
            revision = manifest.version,
            bytes = json.len(),
            "manifest written"
        );

        Ok(json)
    }
}
