//! Config command - show configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::RouteCacheResult;
use std::path::Path;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    local: Option<&Path>,
) -> RouteCacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager, local),
    }
    Ok(())
}

fn show_config(config: &Config) -> RouteCacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager, local: Option<&Path>) {
    println!("{}", manager.path().display());
    if let Some(local) = local {
        println!("{}", local.display());
    }
}
