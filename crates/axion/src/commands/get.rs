//! `axion get`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_core::error::Error;
use axion_secrets::{Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Variable name
    pub key: String,

    /// Service bucket
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Print the plaintext value (refused for protected keys)
    #[arg(long)]
    pub reveal: bool,
}

pub async fn run(args: GetArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    let manifest = arbiter.load().await?;
    let engine = arbiter.engine();

    if args.reveal {
        // Plain value on stdout, for shell substitution.
        let value = engine
            .reveal(&manifest, &args.key, &args.service, args.scope)
            .await?;
        println!("{value}");
        return Ok(());
    }

    let resolved = engine
        .variables(&manifest, &args.service, args.scope)
        .await?;
    match resolved.get(&args.key) {
        Some(value) => {
            output::kv(&args.key, &output::mask(value));
            output::info("use --reveal to print the plaintext value");
            Ok(())
        }
        None => Err(Error::variable_not_found(&args.key).into()),
    }
}
