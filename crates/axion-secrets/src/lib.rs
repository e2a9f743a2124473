//! Secret core for Axion
//!
//! This crate is the heart of the secrets plane:
//! - **Manifest engine**: scoped data model, fixed resolution order,
//!   template interpolation with cycle detection, drift comparison
//! - **Crash-safe rotation**: backup, re-encrypt, verify, rollback
//! - **Sync arbiter**: local/cloud reconciliation by revision on load,
//!   silent best-effort push on save
//! - **Process injector**: child spawn with merged environment, signal
//!   forwarding, exit-status propagation
//! - **SDK surface**: cached in-process access for embedders

pub mod drift;
pub mod engine;
pub mod injector;
pub mod manifest;
pub mod parser;
pub mod resolve;
pub mod rotation;
pub mod sdk;
pub mod store;
pub mod sync;

pub use drift::{DriftEntry, DriftModified, DriftReport};
pub use engine::SecretsEngine;
pub use injector::{run, RunOptions};
pub use manifest::{Manifest, Scope, VariableMap, GLOBAL_SERVICE};
pub use rotation::{Rotation, RotationOutcome};
pub use sdk::{
    clear_cache, clear_cache_for, create_client, get_secrets, load_secrets, SecretOptions,
    SecretsClient,
};
pub use store::ManifestStore;
pub use sync::SyncArbiter;
