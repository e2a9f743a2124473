//! Crash-safe key rotation
//!
//! Rotation re-encrypts the manifest under a new project key without ever
//! leaving the key file and the ciphertext in a mismatched state:
//!
//! 1. read the old key and decrypt the manifest
//! 2. choose the new key (supplied or generated)
//! 3. copy the ciphertext to a `.backup` sibling
//! 4. write the new key file
//! 5. re-encrypt and write the ciphertext
//! 6. re-read and verify round-trip equality
//! 7. delete the backup
//!
//! Any failure from step 4 onward restores both files to their prior
//! state before surfacing the original error; a failed restore surfaces a
//! composite error naming the backup path.

use tracing::{info, warn};

use axion_core::envelope::KdfParams;
use axion_core::error::{Error, Result};
use axion_core::keystore::{KeyStore, ProjectKey};
use axion_core::paths::ProjectPaths;

use crate::manifest::Manifest;
use crate::store::ManifestStore;

/// Keys involved in a completed rotation.
pub struct RotationOutcome {
    pub old_key: ProjectKey,
    pub new_key: ProjectKey,
}

impl std::fmt::Debug for RotationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationOutcome").finish_non_exhaustive()
    }
}

/// One rotation run over a project directory.
pub struct Rotation {
    paths: ProjectPaths,
    keystore: KeyStore,
    store: ManifestStore,
    #[cfg(test)]
    fault: Fault,
}

#[cfg(test)]
#[derive(Clone, Copy, PartialEq)]
enum Fault {
    None,
    /// Force the verification step to report a mismatch.
    Verification,
    /// Lose the backup right before a forced verification failure, so the
    /// rollback itself cannot complete.
    VerificationWithLostBackup,
}

impl Rotation {
    pub fn new(paths: ProjectPaths, kdf_params: KdfParams) -> Self {
        Self {
            keystore: KeyStore::new(paths.clone()),
            store: ManifestStore::new(paths.clone()).with_kdf_params(kdf_params),
            paths,
            #[cfg(test)]
            fault: Fault::None,
        }
    }

    /// Rotate to `new_key`, or to a freshly generated key.
    pub async fn run(&self, new_key: Option<ProjectKey>) -> Result<RotationOutcome> {
        let old_key = self.keystore.load()?;
        let manifest = self.store.load(&old_key).await?;
        let new_key = match new_key {
            Some(key) => key,
            None => ProjectKey::generate(),
        };

        let Some(manifest) = manifest else {
            // Initialised but never saved: only the key file changes.
            self.keystore.save(&new_key)?;
            info!(
                old = %old_key.fingerprint(),
                new = %new_key.fingerprint(),
                "key rotated (no manifest on disk)"
            );
            return Ok(RotationOutcome { old_key, new_key });
        };

        let backup_path = self.paths.manifest_backup_path();
        std::fs::copy(self.paths.manifest_path(), &backup_path)?;

        match self.reencrypt(&manifest, &new_key).await {
            Ok(()) => {
                let _ = std::fs::remove_file(&backup_path);
                info!(
                    old = %old_key.fingerprint(),
                    new = %new_key.fingerprint(),
                    "key rotated"
                );
                Ok(RotationOutcome { old_key, new_key })
            }
            Err(original) => {
                warn!(error = %original, "rotation failed, rolling back");
                match self.rollback(&old_key) {
                    Ok(()) => Err(original),
                    Err(rollback_err) => {
                        warn!(error = %rollback_err, "rollback failed");
                        Err(Error::RotationRollbackFailed {
                            backup_path,
                            source: Box::new(original),
                        })
                    }
                }
            }
        }
    }

    /// Steps 4–6: everything that mutates state and must roll back.
    async fn reencrypt(&self, manifest: &Manifest, new_key: &ProjectKey) -> Result<()> {
        self.keystore.save(new_key)?;
        self.store.save(manifest, new_key).await?;

        #[cfg(test)]
        if self.fault == Fault::VerificationWithLostBackup {
            std::fs::remove_file(self.paths.manifest_backup_path())?;
        }

        let reread = self
            .store
            .load(new_key)
            .await?
            .ok_or(Error::VerificationFailed)?;

        #[cfg(test)]
        if self.fault != Fault::None {
            return Err(Error::VerificationFailed);
        }

        if &reread != manifest {
            return Err(Error::VerificationFailed);
        }
        Ok(())
    }

    /// Restore the ciphertext from the backup and re-install the old key.
    fn rollback(&self, old_key: &ProjectKey) -> Result<()> {
        let backup_path = self.paths.manifest_backup_path();
        std::fs::copy(&backup_path, self.paths.manifest_path())?;
        self.keystore.save(old_key)?;
        let _ = std::fs::remove_file(&backup_path);
        Ok(())
    }
}
