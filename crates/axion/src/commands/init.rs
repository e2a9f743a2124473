//! `axion init`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct InitArgs {}

pub async fn run(_args: InitArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let engine = common::engine(cwd)?;
    let already = engine.is_initialised();

    let key = engine.init().await?;
    if already {
        output::info("project already initialised");
    } else {
        output::success("project initialised");
    }
    output::kv("key fingerprint", &key.fingerprint());
    output::kv(
        "config dir",
        &engine.paths().config_dir().display().to_string(),
    );
    Ok(())
}
