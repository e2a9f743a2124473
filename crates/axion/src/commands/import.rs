//! `axion import`

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;

use axion_secrets::{parser, Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// .env file to import
    pub file: Utf8PathBuf,

    /// Service bucket
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope
    #[arg(long)]
    pub scope: Option<Scope>,
}

pub async fn run(args: ImportArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file))?;
    let pairs = parser::parse(&text);
    if pairs.is_empty() {
        output::warning("no variables found in file");
        return Ok(());
    }

    let arbiter = common::arbiter(cwd)?;
    let mut manifest = arbiter.load().await?;
    let count = arbiter
        .engine()
        .import(&mut manifest, &pairs, &args.service, args.scope)?;
    arbiter.save(&mut manifest).await?;

    output::success(&format!(
        "imported {} variables from {} into {}",
        count, args.file, args.service
    ));
    Ok(())
}
