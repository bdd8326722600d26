//! CLI argument definitions using clap derive

use crate::policy::PolicyStrategy;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// routecache - add server-side caching to Next.js API routes
///
/// Wraps the data-fetch query of each GET route handler in
/// `unstable_cache` with a revalidation interval and tag derived from
/// the route path.
#[derive(Parser, Debug)]
#[command(name = "routecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ROUTECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .routecache.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add caching to route handlers
    Apply(ApplyArgs),

    /// Show the caching policy resolved for routes
    Policy(PolicyArgs),

    /// Initialize a project-local .routecache.toml config
    Init(InitArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Route files to process (defaults to every route under the API dir)
    pub paths: Vec<PathBuf>,

    /// Project root containing the API directory (defaults to current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Compute and report changes without writing files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only add the required imports, never wrap queries
    #[arg(long)]
    pub imports_only: bool,

    /// Policy strategy override: layered, table, keywords
    #[arg(short, long)]
    pub strategy: Option<PolicyStrategy>,

    /// Summary output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Write files without confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the policy command
#[derive(Parser, Debug)]
pub struct PolicyArgs {
    /// Route paths, e.g. app/api/search/tickets/route.ts
    #[arg(required = true)]
    pub routes: Vec<String>,

    /// Policy strategy override: layered, table, keywords
    #[arg(short, long)]
    pub strategy: Option<PolicyStrategy>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing .routecache.toml
    #[arg(short, long)]
    pub force: bool,

    /// Directory to create the config in (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Output format for apply and policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Table,
    /// JSON output
    Json,
    /// Simple text, no styling or progress
    Plain,
}

impl OutputFormat {
    /// Machine-oriented formats suppress step lines, bars and prompts
    pub fn is_machine(&self) -> bool {
        !matches!(self, Self::Table)
    }
}
