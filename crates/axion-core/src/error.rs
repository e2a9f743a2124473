//! Error types for the Axion crates

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using axion-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the Axion crates
#[derive(Error, Debug)]
pub enum Error {
    /// No project key on disk; `axion init` has not been run
    #[error("project not initialised: no key at {path}. Run `axion init` first")]
    NotInitialised { path: String },

    /// GCM tag mismatch: wrong key or tampered ciphertext
    #[error("decryption failed: authentication tag mismatch (wrong key or corrupted data)")]
    AuthenticationFailed,

    /// Envelope written by a newer client
    #[error("unsupported envelope version {found} (this build reads up to {supported}); upgrade axion")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Key material is not 32 lowercase hex characters
    #[error("invalid key format: expected 32 hex characters")]
    InvalidKeyFormat,

    /// A hex-encoded envelope field failed to decode
    #[error("invalid hex in envelope field '{field}'")]
    InvalidHex { field: String },

    /// Value rejected by a policy validation pattern
    #[error("value for '{key}' does not match the configured pattern: {pattern}")]
    ValidationFailed { key: String, pattern: String },

    /// Policy carries a pattern that is not a valid regex
    #[error("validation pattern for '{key}' is not a valid regex: {message}")]
    InvalidPattern { key: String, message: String },

    /// Variable name does not match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("invalid variable name: '{name}'")]
    InvalidVariableName { name: String },

    /// Service name does not match `[A-Za-z][A-Za-z0-9_-]*`
    #[error("invalid service name: '{name}'")]
    InvalidServiceName { name: String },

    /// Unknown deployment scope
    #[error("unknown scope '{scope}'. Valid scopes: development, staging, production")]
    InvalidScope { scope: String },

    /// Lookup of a variable that is not set
    #[error("variable '{key}' not found")]
    VariableNotFound { key: String },

    /// Template references a variable missing from the resolved map
    #[error("template references undefined variable '{name}'")]
    MissingReference { name: String },

    /// Cycle in the template reference graph
    #[error("circular template reference: {chain}")]
    CircularReference { chain: String },

    /// Reveal refused for a protected key
    #[error("'{key}' is a protected key and cannot be revealed")]
    ProtectedKey { key: String },

    /// Post-rotation round-trip did not reproduce the manifest
    #[error("rotation verification failed: re-encrypted manifest does not round-trip")]
    VerificationFailed,

    /// Rotation failed and the rollback also failed
    #[error("rotation rollback failed; restore manually from backup at {}: {source}", backup_path.display())]
    RotationRollbackFailed {
        backup_path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Cloud manifest was sealed under a different project key
    #[error("cloud key fingerprint {cloud} does not match local fingerprint {local}")]
    KeyMismatch { local: String, cloud: String },

    /// Remote vault call failed
    #[error("cloud request failed: {message}")]
    Network { message: String },

    /// No service token and no stored credentials
    #[error("not authenticated: set AXION_TOKEN or run `axion login`")]
    NotAuthenticated,

    /// Child process could not be started
    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Key derivation error
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption error
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a not-initialised error
    pub fn not_initialised(path: impl Into<String>) -> Self {
        Self::NotInitialised { path: path.into() }
    }

    /// Create an unsupported-version error against the current format
    pub fn unsupported_version(found: u32, supported: u32) -> Self {
        Self::UnsupportedVersion { found, supported }
    }

    /// Create an invalid-hex error for an envelope field
    pub fn invalid_hex(field: impl Into<String>) -> Self {
        Self::InvalidHex {
            field: field.into(),
        }
    }

    /// Create a validation-failed error
    pub fn validation_failed(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::ValidationFailed {
            key: key.into(),
            pattern: pattern.into(),
        }
    }

    /// Create an invalid-variable-name error
    pub fn invalid_variable_name(name: impl Into<String>) -> Self {
        Self::InvalidVariableName { name: name.into() }
    }

    /// Create an invalid-service-name error
    pub fn invalid_service_name(name: impl Into<String>) -> Self {
        Self::InvalidServiceName { name: name.into() }
    }

    /// Create a variable-not-found error
    pub fn variable_not_found(key: impl Into<String>) -> Self {
        Self::VariableNotFound { key: key.into() }
    }

    /// Create a missing-reference error
    pub fn missing_reference(name: impl Into<String>) -> Self {
        Self::MissingReference { name: name.into() }
    }

    /// Create a circular-reference error from the in-progress chain
    pub fn circular_reference(chain: &[String]) -> Self {
        Self::CircularReference {
            chain: chain.join(" -> "),
        }
    }

    /// Create a key-mismatch error
    pub fn key_mismatch(local: impl Into<String>, cloud: impl Into<String>) -> Self {
        Self::KeyMismatch {
            local: local.into(),
            cloud: cloud.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a spawn-failed error
    pub fn spawn_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            source,
        }
    }
}
