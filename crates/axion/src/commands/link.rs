//! `axion link`

use anyhow::Result;
use camino::Utf8Path;
use chrono::Utc;
use clap::Args;

use axion_core::config::CloudLink;
use axion_core::paths::ProjectPaths;

use super::common;
use crate::output;

/// Default cloud endpoint, overridable per-link or via `AXION_API_URL`.
const DEFAULT_API_URL: &str = "https://api.axion.dev";

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Cloud project identifier
    #[arg(long)]
    pub project_id: String,

    /// API endpoint for this project
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

pub async fn run(args: LinkArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let paths = ProjectPaths::new(common::work_dir(cwd));

    let link = CloudLink {
        project_id: args.project_id.clone(),
        api_url: args.api_url.clone(),
        linked_at: Utc::now().to_rfc3339(),
    };
    link.save(&paths)?;

    output::success(&format!("linked to project {}", args.project_id));
    output::kv("api url", &args.api_url);
    output::info("run `axion push` to upload the local manifest");
    Ok(())
}
