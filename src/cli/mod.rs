//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod commands;

/// Project-scoped issue tracker (`SQLite` + HTTP)
#[derive(Parser, Debug)]
#[command(name = "desk", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to .issue_desk/issues.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output exactly the JSON an HTTP client would receive
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize an issue desk workspace in the current directory
    Init {
        /// Rewrite the config of an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Create a new issue
    Create(CreateArgs),

    /// List issues in a project
    List(ListArgs),

    /// Update fields of an issue
    Update(UpdateArgs),

    /// Delete an issue
    Delete(DeleteArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// List project names in order of first write
    Projects,

    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project name
    pub project: String,

    /// Issue title
    #[arg(long)]
    pub title: Option<String>,

    /// Issue text
    #[arg(long)]
    pub text: Option<String>,

    /// Reporter
    #[arg(long)]
    pub created_by: Option<String>,

    /// Assignee
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Free-form status note
    #[arg(long)]
    pub status_text: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Project name
    pub project: String,

    /// Equality filter (repeatable)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Filter by id
    #[arg(long)]
    pub id: Option<String>,

    /// Filter by exact title
    #[arg(long)]
    pub title: Option<String>,

    /// Filter by exact text
    #[arg(long)]
    pub text: Option<String>,

    /// Filter by reporter
    #[arg(long)]
    pub created_by: Option<String>,

    /// Filter by assignee
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Filter by status note
    #[arg(long)]
    pub status_text: Option<String>,

    /// Filter by open state (true/false)
    #[arg(long)]
    pub open: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Project name
    pub project: String,

    /// Issue id
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New text
    #[arg(long)]
    pub text: Option<String>,

    /// New assignee
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// New status note
    #[arg(long)]
    pub status_text: Option<String>,

    /// Mark the issue closed
    #[arg(long)]
    pub close: bool,

    /// Mark the issue open again
    #[arg(long, conflicts_with = "close")]
    pub reopen: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Project name
    pub project: String,

    /// Issue id
    pub id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (default 127.0.0.1:3000)
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Keep records in memory only
    #[arg(long)]
    pub memory: bool,
}
