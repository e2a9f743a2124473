//! Shared helpers for the command modules

use std::path::PathBuf;

use anyhow::Result;
use camino::Utf8Path;

use axion_secrets::{SecretsEngine, SyncArbiter};

/// CLI version reported to the cloud in audit metadata.
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the project working directory from the global `--cwd` flag.
pub fn work_dir(cwd: Option<&Utf8Path>) -> PathBuf {
    match cwd {
        Some(path) => path.as_std_path().to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Build an engine bound to the project directory.
pub fn engine(cwd: Option<&Utf8Path>) -> Result<SecretsEngine> {
    Ok(SecretsEngine::new(work_dir(cwd))?)
}

/// Build a sync arbiter, cloud-attached when the project is linked.
pub fn arbiter(cwd: Option<&Utf8Path>) -> Result<SyncArbiter> {
    Ok(SyncArbiter::for_project(engine(cwd)?, CLI_VERSION))
}
