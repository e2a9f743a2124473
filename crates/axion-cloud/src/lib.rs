//! Remote vault transport for Axion
//!
//! The cloud only ever sees ciphertext: this crate moves sealed envelopes
//! between the local manifest store and the remote vault API. It provides:
//! - The [`RemoteVault`] trait — the seam the sync arbiter talks through
//! - [`CloudClient`], the reqwest implementation with bearer auth and the
//!   per-request `X-Axion-Metadata` audit header
//! - Credential loading with the `AXION_TOKEN` service-token override

pub mod client;
pub mod credentials;
pub mod types;

pub use client::{CloudClient, RemoteVault};
pub use credentials::{resolve_api_url, resolve_token, Credentials};
pub use types::{CloudManifest, ManifestHistoryEntry, PulseResponse, UploadRequest};
