//! `axion run`

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use clap::Args;

use axion_secrets::{injector, RunOptions, Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Service bucket to resolve secrets for
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Extra KEY=VALUE pairs, win over manifest values
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Run the command line through `sh -c`
    #[arg(long)]
    pub shell: bool,

    /// Command and arguments to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

pub async fn run(args: RunArgs, cwd: Option<&Utf8Path>) -> Result<i32> {
    let arbiter = common::arbiter(cwd)?;
    let manifest = arbiter.load().await?;

    let mut env: HashMap<String, String> = arbiter
        .engine()
        .variables(&manifest, &args.service, args.scope)
        .await?
        .into_iter()
        .collect();
    for pair in &args.env {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --env pair '{pair}', expected KEY=VALUE"))?;
        env.insert(key.to_string(), value.to_string());
    }

    let (command, rest) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;
    tracing::debug!(command, injected = env.len(), "running with injected secrets");

    let opts = RunOptions {
        env,
        cwd: cwd.map(|p| p.as_std_path().to_path_buf()),
        shell: args.shell,
    };
    let code = injector::run(command, rest, opts).await?;
    if code != 0 {
        output::warning(&format!("command exited with status {code}"));
    }
    Ok(code)
}
