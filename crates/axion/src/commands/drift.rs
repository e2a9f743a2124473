//! `axion drift`

use anyhow::Result;
use camino::Utf8Path;
use clap::Args;

use axion_secrets::DriftReport;

use super::common;
use crate::output;

#[derive(Args, Debug)]
pub struct DriftArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: DriftArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let arbiter = common::arbiter(cwd)?;

    let spinner = output::spinner("Fetching cloud manifest...");
    let remote = arbiter.fetch_remote().await;
    spinner.finish_and_clear();

    let Some((record, cloud)) = remote? else {
        output::info("no manifest on the cloud yet; nothing to compare");
        return Ok(());
    };

    let local = arbiter.engine().load_local().await?;
    let report = DriftReport::compute(&local, &cloud);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_clean() {
        output::success(&format!(
            "in sync with cloud version {} (updated {} by {})",
            record.version, record.updated_at, record.updated_by
        ));
        return Ok(());
    }

    output::header(&format!("{} differences", report.len()));
    if !report.local_only.is_empty() {
        output::info("local only:");
        for entry in &report.local_only {
            output::kv(&entry.key, &format!("({})", entry.service));
        }
    }
    if !report.cloud_only.is_empty() {
        output::info("cloud only:");
        for entry in &report.cloud_only {
            output::kv(&entry.key, &format!("({})", entry.service));
        }
    }
    if !report.modified.is_empty() {
        output::info("modified:");
        for entry in &report.modified {
            output::kv(&entry.key, &format!("({})", entry.service));
        }
    }
    output::info("use `axion push` or `axion pull` to reconcile");
    Ok(())
}
