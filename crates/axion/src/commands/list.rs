//! `axion list`

use std::collections::BTreeMap;

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_secrets::{Scope, GLOBAL_SERVICE};

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Service bucket
    #[arg(short, long, default_value = GLOBAL_SERVICE)]
    pub service: String,

    /// Deployment scope
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show plaintext values (protected keys stay masked)
    #[arg(long)]
    pub reveal: bool,
}

pub async fn run(args: ListArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;
    let manifest = arbiter.load().await?;
    let engine = arbiter.engine();

    let resolved = engine
        .variables(&manifest, &args.service, args.scope)
        .await?;

    let display: BTreeMap<&str, String> = resolved
        .iter()
        .map(|(key, value)| {
            let shown = if args.reveal && !engine.policy().is_protected(key) {
                value.clone()
            } else {
                output::mask(value)
            };
            (key.as_str(), shown)
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&display)?);
        return Ok(());
    }

    if display.is_empty() {
        output::info("no variables set");
        return Ok(());
    }

    let scope_label = args
        .scope
        .map(|s| s.to_string())
        .unwrap_or_else(|| "default".to_string());
    output::header(&format!(
        "{} variables ({} / {})",
        display.len(),
        args.service,
        scope_label
    ));
    for (key, value) in &display {
        output::kv(key, value);
    }
    if !args.reveal {
        output::info("use --reveal to show values");
    }
    Ok(())
}
