//! Per-project key storage
//!
//! The project key is a 128-bit random value stored as 32 lowercase hex
//! characters in `.axion/key`, owner-readable only. The key itself never
//! leaves the machine; its fingerprint (leading 64 bits of SHA-256 over
//! the stored hex form) is safe to display and transmit.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::envelope::{Envelope, KdfParams};
use crate::error::{Error, Result};
use crate::paths::{self, ProjectPaths};

/// Raw key length in bytes (128 bits).
pub const KEY_BYTES: usize = 16;

/// Fingerprint length in hex characters (64 bits).
const FINGERPRINT_HEX_LEN: usize = 16;

/// A project key: 32 lowercase hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse and validate key material (32 hex chars, case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != KEY_BYTES * 2 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidKeyFormat);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The hex form as persisted on disk (without the trailing newline).
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Leading 64 bits of SHA-256 over the stored hex form, hex-encoded.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..FINGERPRINT_HEX_LEN / 2])
    }
}

// The hex form is the secret; keep it out of Debug output.
impl std::fmt::Debug for ProjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProjectKey({})", self.fingerprint())
    }
}

/// Loads and persists the project key file.
#[derive(Debug, Clone)]
pub struct KeyStore {
    paths: ProjectPaths,
}

impl KeyStore {
    pub fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    /// Whether a key file exists.
    pub fn exists(&self) -> bool {
        self.paths.key_path().exists()
    }

    /// Read the project key. Absent file means the project was never
    /// initialised.
    pub fn load(&self) -> Result<ProjectKey> {
        let path = self.paths.key_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_initialised(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        ProjectKey::parse(&raw)
    }

    /// Persist the key with owner-only permissions, atomically.
    pub fn save(&self, key: &ProjectKey) -> Result<()> {
        self.paths.ensure_dir()?;
        let contents = format!("{}\n", key.as_hex());
        paths::write_atomic(&self.paths.key_path(), contents.as_bytes(), Some(0o600))?;
        debug!(fingerprint = %key.fingerprint(), "project key written");
        Ok(())
    }

    /// Build a portable recovery capsule: the key sealed under a user
    /// passphrase, base64-wrapped for copy/paste transport.
    pub fn recovery_blob(&self, password: &str, params: KdfParams) -> Result<String> {
        let key = self.load()?;
        let envelope = Envelope::seal_with_params(key.as_hex().as_bytes(), password, params)?;
        Ok(BASE64.encode(envelope.to_bytes()?))
    }

    /// Decode a recovery capsule and install the key it contains,
    /// replacing any existing key file.
    pub fn restore_from_blob(&self, password: &str, blob: &str) -> Result<ProjectKey> {
        let raw = BASE64
            .decode(blob.trim())
            .map_err(|e| Error::Encryption(format!("recovery blob is not valid base64: {e}")))?;
        let envelope = Envelope::from_bytes(&raw)?;
        let plaintext = envelope.open(password)?;
        let key = ProjectKey::parse(
            std::str::from_utf8(&plaintext).map_err(|_| Error::InvalidKeyFormat)?,
        )?;
        self.save(&key)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> KeyStore {
        KeyStore::new(ProjectPaths::new(tmp.path()))
    }

    #[test]
    fn test_generate_is_valid_hex() {
        let key = ProjectKey::generate();
        assert_eq!(key.as_hex().len(), 32);
        assert!(key.as_hex().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_rejects_bad_material() {
        assert!(ProjectKey::parse("too-short").is_err());
        assert!(ProjectKey::parse(&"g".repeat(32)).is_err());
        assert!(ProjectKey::parse(&"a".repeat(31)).is_err());
        assert!(ProjectKey::parse(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let key = ProjectKey::parse("  ABCDEF0123456789abcdef0123456789\n").unwrap();
        assert_eq!(key.as_hex(), "abcdef0123456789abcdef0123456789");
    }

    #[test]
    fn test_fingerprint_deterministic_and_short() {
        let key = ProjectKey::generate();
        assert_eq!(key.fingerprint(), key.fingerprint());
        assert_eq!(key.fingerprint().len(), 16);
        assert_ne!(ProjectKey::generate().fingerprint(), key.fingerprint());
    }

    #[test]
    fn test_debug_never_prints_key_material() {
        let key = ProjectKey::generate();
        let debug = format!("{key:?}");
        assert!(!debug.contains(key.as_hex()));
        assert!(debug.contains(&key.fingerprint()));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let key = ProjectKey::generate();
        store.save(&key).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, key);

        let raw = std::fs::read_to_string(store.paths.key_path()).unwrap();
        assert_eq!(raw, format!("{}\n", key.as_hex()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.paths.key_path())
                .unwrap()
                .permissions();
            assert_eq!(mode.mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn test_load_missing_key_is_not_initialised() {
        let tmp = TempDir::new().unwrap();
        let result = store(&tmp).load();
        assert!(matches!(result, Err(Error::NotInitialised { .. })));
    }

    #[test]
    fn test_recovery_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let key = ProjectKey::generate();
        store.save(&key).unwrap();

        let blob = store
            .recovery_blob("hunter2", KdfParams::insecure_for_tests())
            .unwrap();

        // Simulate a new machine: wipe the key, restore from the capsule.
        std::fs::remove_file(store.paths.key_path()).unwrap();
        let restored = store.restore_from_blob("hunter2", &blob).unwrap();
        assert_eq!(restored, key);
        assert_eq!(store.load().unwrap(), key);
    }

    #[test]
    fn test_recovery_wrong_password_fails() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.save(&ProjectKey::generate()).unwrap();

        let blob = store
            .recovery_blob("right", KdfParams::insecure_for_tests())
            .unwrap();
        let result = store.restore_from_blob("wrong", &blob);
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }
}
