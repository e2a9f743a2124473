//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

pub use crate::commands::drift::DriftArgs;
pub use crate::commands::get::GetArgs;
pub use crate::commands::history::HistoryArgs;
pub use crate::commands::import::ImportArgs;
pub use crate::commands::init::InitArgs;
pub use crate::commands::link::LinkArgs;
pub use crate::commands::list::ListArgs;
pub use crate::commands::pull::PullArgs;
pub use crate::commands::push::PushArgs;
pub use crate::commands::recovery::RecoveryCommands;
pub use crate::commands::rollback::RollbackArgs;
pub use crate::commands::rotate::RotateArgs;
pub use crate::commands::run::RunArgs;
pub use crate::commands::set::SetArgs;
pub use crate::commands::unset::UnsetArgs;

/// Axion - encrypted environment variables for developer projects
#[derive(Parser, Debug)]
#[command(name = "axion")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub cwd: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialise the project: generate a key and an empty manifest
    Init(InitArgs),

    /// Set a variable
    Set(SetArgs),

    /// Read a variable (masked unless --reveal)
    Get(GetArgs),

    /// Remove a variable
    Unset(UnsetArgs),

    /// List resolved variables for a service and scope
    List(ListArgs),

    /// Import variables from a .env file
    Import(ImportArgs),

    /// Run a command with secrets injected into its environment
    Run(RunArgs),

    /// Rotate the project key
    Rotate(RotateArgs),

    /// Compare the local manifest against the cloud
    Drift(DriftArgs),

    /// Push the local manifest to the cloud
    Push(PushArgs),

    /// Pull the cloud manifest, replacing the local one
    Pull(PullArgs),

    /// Show the cloud manifest history
    History(HistoryArgs),

    /// Roll the cloud manifest back to an earlier version
    Rollback(RollbackArgs),

    /// Link this project to a cloud project
    Link(LinkArgs),

    /// Key recovery capsules
    #[command(subcommand)]
    Recovery(RecoveryCommands),
}
