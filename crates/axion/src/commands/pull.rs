//! `axion pull`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct PullArgs {}

pub async fn run(_args: PullArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;

    let spinner = output::spinner("Pulling manifest...");
    let result = arbiter.pull().await;
    spinner.finish_and_clear();

    match result? {
        Some(manifest) => {
            output::success(&format!(
                "pulled; local manifest is now at revision {}",
                manifest.version
            ));
        }
        None => output::info("no manifest on the cloud yet"),
    }
    Ok(())
}
