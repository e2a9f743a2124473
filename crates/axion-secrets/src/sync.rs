//! Sync arbiter
//!
//! Reconciles the local and remote manifests on every load and pushes on
//! every save. The arbiter never merges content: the manifest revision
//! picks the winner, ties resolve to the cloud. Remote calls are
//! best-effort; the local ciphertext stays authoritative when the network
//! is away.

use tracing::{debug, warn};

use axion_cloud::client::RemoteVault;
use axion_cloud::types::CloudManifest;
use axion_cloud::CloudClient;
use axion_core::config::CloudLink;
use axion_core::envelope::Envelope;
use axion_core::error::{Error, Result};
use axion_core::keystore::ProjectKey;
use axion_core::paths;

use crate::engine::SecretsEngine;
use crate::manifest::Manifest;

pub struct SyncArbiter {
    engine: SecretsEngine,
    remote: Option<Box<dyn RemoteVault>>,
}

impl SyncArbiter {
    /// A local-only arbiter.
    pub fn new(engine: SecretsEngine) -> Self {
        Self {
            engine,
            remote: None,
        }
    }

    /// An arbiter with an explicit remote (tests inject mocks here).
    pub fn with_remote(engine: SecretsEngine, remote: Box<dyn RemoteVault>) -> Self {
        Self {
            engine,
            remote: Some(remote),
        }
    }

    /// Build an arbiter for a project directory, attaching a cloud client
    /// when the project is linked and credentials resolve. A link without
    /// credentials degrades to local-only with a warning.
    pub fn for_project(engine: SecretsEngine, cli_version: &str) -> Self {
        let remote: Option<Box<dyn RemoteVault>> = match CloudLink::load(engine.paths()) {
            Ok(Some(link)) => match CloudClient::new(&link, cli_version) {
                Ok(client) => Some(Box::new(client)),
                Err(e) => {
                    warn!(error = %e, "cloud link present but client unavailable, staying local");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cloud link unreadable, staying local");
                None
            }
        };
        Self { engine, remote }
    }

    pub fn engine(&self) -> &SecretsEngine {
        &self.engine
    }

    pub fn is_cloud_linked(&self) -> bool {
        self.remote.is_some()
    }

    pub fn remote(&self) -> Option<&dyn RemoteVault> {
        self.remote.as_deref()
    }

    /// Load the winning manifest: higher revision wins, ties go to the
    /// cloud, an unreachable or undecryptable side is treated as absent.
    pub async fn load(&self) -> Result<Manifest> {
        let key = self.engine.keystore().load()?;

        let local = match self.engine.store().load(&key).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "local manifest unreadable, treating as absent");
                None
            }
        };

        let cloud = match &self.remote {
            Some(remote) => self.fetch_cloud(remote.as_ref(), &key).await,
            None => None,
        };

        Ok(match (local, cloud) {
            (Some(local), Some(cloud)) => {
                if cloud.version >= local.version {
                    debug!(
                        local = local.version,
                        cloud = cloud.version,
                        "cloud manifest wins"
                    );
                    cloud
                } else {
                    debug!(
                        local = local.version,
                        cloud = cloud.version,
                        "local manifest wins"
                    );
                    local
                }
            }
            (Some(local), None) => local,
            (None, Some(cloud)) => cloud,
            (None, None) => Manifest::new(),
        })
    }

    async fn fetch_cloud(&self, remote: &dyn RemoteVault, key: &ProjectKey) -> Option<Manifest> {
        if let Err(e) = remote.pulse().await {
            warn!(error = %e, "heartbeat failed");
        }

        let record = match remote.fetch_manifest().await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "cloud manifest fetch failed");
                return None;
            }
        };

        if let Some(cloud_fp) = &record.key_fingerprint {
            let local_fp = key.fingerprint();
            if cloud_fp != &local_fp {
                warn!(
                    local = %local_fp,
                    cloud = %cloud_fp,
                    "cloud manifest was sealed under a different key; check the project link"
                );
            }
        }

        let decrypted = Envelope::from_bytes(record.encrypted_data.as_bytes())
            .and_then(|envelope| envelope.open(key.as_hex()))
            .and_then(|plaintext| Manifest::from_bytes(&plaintext));
        match decrypted {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(error = %e, "cloud manifest undecryptable, ignoring");
                None
            }
        }
    }

    fn require_remote(&self) -> Result<&dyn RemoteVault> {
        self.remote.as_deref().ok_or_else(|| {
            Error::network("project is not cloud-linked (run `axion link` first)")
        })
    }

    /// Explicit fetch for user-invoked operations: every failure surfaces.
    /// Returns the raw record and its decrypted manifest.
    pub async fn fetch_remote(&self) -> Result<Option<(CloudManifest, Manifest)>> {
        let remote = self.require_remote()?;
        let key = self.engine.keystore().load()?;

        let Some(record) = remote.fetch_manifest().await? else {
            return Ok(None);
        };
        if let Some(cloud_fp) = &record.key_fingerprint {
            let local_fp = key.fingerprint();
            if cloud_fp != &local_fp {
                return Err(Error::key_mismatch(local_fp, cloud_fp.clone()));
            }
        }

        let envelope = Envelope::from_bytes(record.encrypted_data.as_bytes())?;
        let manifest = Manifest::from_bytes(&envelope.open(key.as_hex())?)?;
        Ok(Some((record, manifest)))
    }

    /// Explicit push of the on-disk ciphertext, surfacing every failure.
    pub async fn push(&self) -> Result<CloudManifest> {
        let remote = self.require_remote()?;
        let fingerprint = self.engine.fingerprint()?;
        let path = self.engine.paths().manifest_path();
        let encrypted = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_initialised(path.display().to_string())
            } else {
                e.into()
            }
        })?;
        remote.upload_manifest(&encrypted, &fingerprint).await
    }

    /// Explicit pull: install the remote ciphertext verbatim as the local
    /// manifest and return its decrypted form.
    pub async fn pull(&self) -> Result<Option<Manifest>> {
        let Some((record, manifest)) = self.fetch_remote().await? else {
            return Ok(None);
        };
        self.engine.paths().ensure_dir()?;
        paths::write_atomic(
            &self.engine.paths().manifest_path(),
            record.encrypted_data.as_bytes(),
            Some(0o644),
        )?;
        Ok(Some(manifest))
    }

    /// Persist the manifest: bump the revision, write the local ciphertext
    /// first, then push to the cloud best-effort.
    pub async fn save(&self, manifest: &mut Manifest) -> Result<()> {
        manifest.version += 1;
        let envelope_json = self.engine.save_local(manifest).await?;

        if let Some(remote) = &self.remote {
            let fingerprint = self.engine.fingerprint()?;
            match remote.upload_manifest(&envelope_json, &fingerprint).await {
                Ok(record) => debug!(version = record.version, "cloud push complete"),
                Err(e) => {
                    warn!(error = %e, "cloud push failed; the local save is authoritative")
                }
            }
        }
        Ok(())
    }
}
