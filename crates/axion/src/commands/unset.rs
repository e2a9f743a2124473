//! `axion unset`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_secrets::{Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct UnsetArgs {
    /// Variable name
    pub key: String,

    /// Service bucket
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope
    #[arg(long)]
    pub scope: Option<Scope>,
}

pub async fn run(args: UnsetArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    let mut manifest = arbiter.load().await?;

    if arbiter
        .engine()
        .remove_variable(&mut manifest, &args.key, &args.service, args.scope)
    {
        arbiter.save(&mut manifest).await?;
        output::success(&format!("{} removed", args.key));
    } else {
        output::warning(&format!("{} was not set", args.key));
    }
    Ok(())
}
