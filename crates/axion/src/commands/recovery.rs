//! `axion recovery` - password-encrypted key capsules

use anyhow::Result;
use camino::Utf8Path;
use clap::{Args, Subcommand};

use super::common;
use crate::output;

#[derive(Subcommand, Debug)]
pub enum RecoveryCommands {
    /// Print a portable recovery capsule for the project key
    Setup(SetupArgs),

    /// Restore the project key from a recovery capsule
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Passphrase protecting the capsule
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// The capsule produced by `recovery setup`
    pub blob: String,

    /// Passphrase the capsule was created with
    #[arg(long)]
    pub password: String,
}

pub async fn run(cmd: RecoveryCommands, cwd: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        RecoveryCommands::Setup(args) => setup(args, cwd).await,
        RecoveryCommands::Restore(args) => restore(args, cwd).await,
    }
}

async fn setup(args: SetupArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let engine = common::engine(cwd)?;

    let spinner = output::spinner("Sealing recovery capsule...");
    let result = engine.recovery_setup(&args.password);
    spinner.finish_and_clear();

    let blob = result?;
    output::success("recovery capsule created; store it somewhere safe");
    println!("{blob}");
    Ok(())
}

async fn restore(args: RestoreArgs, cwd: Option<&Utf8Path>) -> Result<()> {
    let engine = common::engine(cwd)?;

    let spinner = output::spinner("Opening recovery capsule...");
    let result = engine.recovery_restore(&args.password, &args.blob);
    spinner.finish_and_clear();

    let key = result?;
    output::success("project key restored");
    output::kv("key fingerprint", &key.fingerprint());
    Ok(())
}
