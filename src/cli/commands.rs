use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("taskboard v", env!("CARGO_PKG_VERSION"), " - a kanban board for your task API"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Base URL of the task API (overrides config and environment)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Path to config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board: one column per status
    List(ListArgs),
    /// Show one task
    Show(ShowArgs),
    /// Create a task
    Add(AddArgs),
    /// Edit a task (unspecified fields keep their current value)
    Edit(EditArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// Move a task to another column
    Move(MoveArgs),
    /// Inspect or change the config file
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only show tasks whose title contains this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID
    pub id: u64,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Title (at least 2 characters)
    #[arg(long)]
    pub title: String,
    /// Details (at least 5 characters)
    #[arg(long)]
    pub details: String,
    /// Author (at least 5 characters)
    #[arg(long)]
    pub author: String,
    /// Status: pending, in_progress, completed, canceled
    #[arg(long, default_value = "PENDING")]
    pub status: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub details: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    /// Status: pending, in_progress, completed, canceled
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID
    pub id: u64,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Task ID
    pub id: u64,
    /// Destination column: pending, in_progress, completed
    pub column: String,
    /// Position in the destination column (default: top)
    #[arg(long, default_value_t = 0)]
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Config args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Store the API base URL in the config file
    SetUrl(SetUrlArgs),
}

#[derive(Args)]
pub struct SetUrlArgs {
    pub url: String,
}
