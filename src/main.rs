//! routecache - add server-side caching to Next.js API routes
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use routecache::cli::{Cli, Commands};
use routecache::config::ConfigManager;
use routecache::error::{RouteCacheError, RouteCacheResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RouteCacheResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug.
    // Logs go to stderr so JSON output on stdout stays parseable.
    let filter = match cli.verbose {
        0 => EnvFilter::new("routecache=warn"),
        1 => EnvFilter::new("routecache=info"),
        _ => EnvFilter::new("routecache=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        return routecache::cli::commands::init(args).await;
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Local config is searched from --root when given, else the cwd
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let start = match cli.command {
            Commands::Apply(ref args) if args.root.is_some() => args.root.clone(),
            _ => None,
        };
        let start = match start {
            Some(root) => root,
            None => std::env::current_dir()
                .map_err(|e| RouteCacheError::io("getting current directory", e))?,
        };
        let found = ConfigManager::find_local_config(&start);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Apply(args) => routecache::cli::commands::apply(args, &config).await,
        Commands::Policy(args) => routecache::cli::commands::policy(args, &config).await,
        Commands::Config(args) => {
            routecache::cli::commands::config(
                args,
                &config,
                &config_manager,
                local_config_path.as_deref(),
            )
            .await
        }
    }
}
