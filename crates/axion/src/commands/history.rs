//! `axion history`

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use clap::Args;

use axion_cloud::client::RemoteVault;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: HistoryArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    let remote = arbiter
        .remote()
        .ok_or_else(|| anyhow!("project is not cloud-linked (run `axion link` first)"))?;

    let entries = remote.fetch_history().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        output::info("no history yet");
        return Ok(());
    }

    output::header(&format!("{} versions", entries.len()));
    for entry in &entries {
        let fingerprint = entry.key_fingerprint.as_deref().unwrap_or("-");
        println!(
            "  v{:<6} {}  {}  key {}",
            entry.version,
            entry.updated_at,
            entry.updated_by,
            fingerprint
        );
    }
    Ok(())
}
