//! `axion push`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct PushArgs {}

pub async fn run(_args: PushArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;

    let spinner = output::spinner("Pushing manifest...");
    let result = arbiter.push().await;
    spinner.finish_and_clear();

    let record = result?;
    output::success(&format!("pushed; cloud is now at version {}", record.version));
    Ok(())
}
