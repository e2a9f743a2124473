//! Authenticated encryption envelope
//!
//! Everything Axion persists or transmits in ciphertext form goes through
//! this envelope: Argon2id turns the project key (or a recovery passphrase)
//! into an AES-256 key, AES-256-GCM seals the payload, and the envelope
//! records the format version, KDF identifier, and KDF parameters so a
//! decryptor never needs out-of-band knowledge. Binary fields travel as
//! lowercase hex.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// KDF identifier recorded in the envelope.
pub const KDF_ARGON2ID: &str = "argon2id";

/// The wire format carries a 128-bit IV, wider than the usual 96-bit
/// AES-GCM nonce, so the cipher is instantiated generically.
type EnvelopeCipher = AesGcm<Aes256, U16>;

pub const IV_LEN: usize = 16;
pub const SALT_LEN: usize = 32;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters, recorded verbatim in every envelope.
///
/// Defaults are the OWASP floor: 64 MiB memory, 3 iterations, 4 lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of iterations
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65_536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Reduced parameters for test suites. Fast but insecure.
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Derive a 256-bit key from a password using Argon2id.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = argon2::Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, output.as_mut())
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(output)
}

/// Self-describing ciphertext bundle.
///
/// Serialised as a JSON object; field order is irrelevant on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Format version for forward compatibility
    pub version: u32,
    /// Key derivation function identifier
    pub kdf: String,
    /// Cost parameters the key was derived with
    pub kdf_params: KdfParams,
    /// Random 128-bit IV, hex
    pub iv: String,
    /// Random 256-bit KDF salt, hex
    pub salt: String,
    /// 128-bit GCM authentication tag, hex
    pub auth_tag: String,
    /// Ciphertext, hex
    pub content: String,
}

impl Envelope {
    /// Encrypt `plaintext` under `password` with the default KDF parameters.
    ///
    /// Every call draws a fresh IV and salt.
    pub fn seal(plaintext: &[u8], password: &str) -> Result<Self> {
        Self::seal_with_params(plaintext, password, KdfParams::default())
    }

    /// Encrypt with explicit KDF parameters (test suites use weak ones).
    pub fn seal_with_params(plaintext: &[u8], password: &str, params: KdfParams) -> Result<Self> {
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);

        let key = derive_key(password, &salt, &params)?;
        let cipher = EnvelopeCipher::new_from_slice(key.as_ref())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let nonce = aes_gcm::Nonce::<U16>::from_slice(&iv);
        let mut sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        // The AEAD appends the tag; the wire format carries it separately.
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(Self {
            version: ENVELOPE_VERSION,
            kdf: KDF_ARGON2ID.to_string(),
            kdf_params: params,
            iv: hex::encode(iv),
            salt: hex::encode(salt),
            auth_tag: hex::encode(tag),
            content: hex::encode(sealed),
        })
    }

    /// Decrypt the envelope, re-deriving the key from the recorded salt
    /// and parameters.
    pub fn open(&self, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        if self.version > ENVELOPE_VERSION {
            return Err(Error::unsupported_version(self.version, ENVELOPE_VERSION));
        }

        let iv = decode_field(&self.iv, "iv", Some(IV_LEN))?;
        let salt = decode_field(&self.salt, "salt", Some(SALT_LEN))?;
        let tag = decode_field(&self.auth_tag, "authTag", Some(TAG_LEN))?;
        let mut ciphertext = decode_field(&self.content, "content", None)?;
        ciphertext.extend_from_slice(&tag);

        let key = derive_key(password, &salt, &self.kdf_params)?;
        let cipher = EnvelopeCipher::new_from_slice(key.as_ref())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let nonce = aes_gcm::Nonce::<U16>::from_slice(&iv);
        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_slice())
            .map_err(|_| Error::AuthenticationFailed)?;

        Ok(Zeroizing::new(plaintext))
    }

    /// Serialize the envelope to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize an envelope from JSON bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

fn decode_field(value: &str, field: &str, expected_len: Option<usize>) -> Result<Vec<u8>> {
    let bytes = hex::decode(value).map_err(|_| Error::invalid_hex(field))?;
    if let Some(len) = expected_len {
        if bytes.len() != len {
            return Err(Error::invalid_hex(field));
        }
    }
    Ok(bytes)
}
