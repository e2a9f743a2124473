//! Core building blocks for Axion
//!
//! This crate provides the pieces every other Axion crate leans on:
//! - **Crypto envelope**: Argon2id key derivation + AES-256-GCM sealed
//!   into a self-describing, versioned envelope
//! - **Key store**: per-project 128-bit key with owner-only persistence
//!   and a transmittable fingerprint
//! - **Device identity**: persistent device UUID + audit metadata
//! - **Configuration**: project policy (protected keys, value patterns)
//!   and the cloud link record
//! - **Errors**: the shared error taxonomy

pub mod config;
pub mod device;
pub mod envelope;
pub mod error;
pub mod keystore;
pub mod paths;

pub use config::{CloudLink, ProjectConfig};
pub use device::{device_id, DeviceMetadata};
pub use envelope::{derive_key, Envelope, KdfParams, ENVELOPE_VERSION};
pub use error::{Error, Result};
pub use keystore::{KeyStore, ProjectKey};
pub use paths::ProjectPaths;
