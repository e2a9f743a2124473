//! `axion rotate`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_core::keystore::ProjectKey;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct RotateArgs {
    /// New key (32 hex chars); generated when omitted
    #[arg(long)]
    pub key: Option<String>,
}

pub async fn run(args: RotateArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let new_key = args.key.as_deref().map(ProjectKey::parse).transpose()?;

    let spinner = output::spinner("Rotating project key...");
    let engine = common::engine(cwd)?;
    let outcome = engine.rotate(new_key).await;
    spinner.finish_and_clear();

    let outcome = outcome?;
    output::success("key rotated and manifest re-encrypted");
    output::kv("old fingerprint", &outcome.old_key.fingerprint());
    output::kv("new fingerprint", &outcome.new_key.fingerprint());

    let arbiter = common::arbiter(cwd)?;
    if arbiter.is_cloud_linked() {
        output::info("pushing re-encrypted manifest to the cloud");
        arbiter.push().await?;
        output::success("cloud manifest updated");
    }
    Ok(())
}
