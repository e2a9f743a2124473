//! `axion set`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_secrets::{Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Variable name
    pub key: String,

    /// Variable value
    pub value: String,

    /// Service bucket (defaults to the shared `_global` bucket)
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope (development, staging, production)
    #[arg(long)]
    pub scope: Option<Scope>,
}

pub async fn run(args: SetArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    let mut manifest = arbiter.load().await?;

    arbiter
        .engine()
        .set_variable(&mut manifest, &args.key, &args.value, &args.service, args.scope)?;
    arbiter.save(&mut manifest).await?;

    let target = match args.scope {
        Some(scope) => format!("{}/{}", scope, args.service),
        None => args.service.clone(),
    };
    output::success(&format!(
        "{} = {} ({})",
        args.key,
        output::mask(&args.value),
        target
    ));
    Ok(())
}
