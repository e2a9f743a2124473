//! `axion rollback`

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use clap::Args;

use axion_cloud::client::RemoteVault;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Cloud version to restore
    #[arg(long)]
    pub version: u64,
}

pub async fn run(args: RollbackArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    {
        let remote = arbiter
            .remote()
            .ok_or_else(|| anyhow!("project is not cloud-linked (run `axion link` first)"))?;

        let spinner = output::spinner(&format!("Rolling back to version {}...", args.version));
        let result = remote.rollback(args.version).await;
        spinner.finish_and_clear();
        result?;
    }
    output::success(&format!("cloud rolled back to version {}", args.version));

    match arbiter.pull().await? {
        Some(manifest) => output::success(&format!(
            "local manifest updated to revision {}",
            manifest.version
        )),
        None => output::warning("rollback succeeded but the cloud returned no manifest"),
    }
    Ok(())
}
