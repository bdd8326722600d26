//! Init command - create project-local .routecache.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{RouteCacheError, RouteCacheResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# routecache project configuration
# Settings here override your global config (~/.config/routecache/config.toml).
# Tables merge key by key; lists and values replace the global ones.

[discovery]
# api_dir = "app/api"
# route_file = "route.ts"
# skip_dirs = ["node_modules", ".next", ".git"]

[policy]
# strategy = "layered"          # layered, table, keywords
# default_revalidate = 300
# default_tag = "general"
# durations = [
#   { keyword = "search", revalidate = 60 },
#   { keyword = "knowledge", revalidate = 3600 },
# ]
# tags = [
#   { keyword = "ticket", tag = "tickets" },
#   { keyword = "service", tag = "services" },
# ]

# Exact per-route policies. Defining any route replaces the built-in table.
# [policy.routes."app/api/users/[id]/route.ts"]
# tag = "users"
# revalidate = 300
# cache_key = "user"

[eligibility]
# excluded = ["auth/", "create-", "token-sync", "reset-password"]

[imports]
# anchor_module = "next/server"
# required = [
#   { symbol = "unstable_cache", module = "next/cache" },
#   { symbol = "CACHE_TAGS", module = "@/lib/cache" },
# ]

[wrap]
# enabled = true
# wrapper = "unstable_cache"
# tag_registry = "CACHE_TAGS"
# clients = ["supabase", "client", "query"]
# params_ident = "params"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> RouteCacheResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| RouteCacheError::io("getting current directory", e))?,
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(RouteCacheError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| RouteCacheError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> RouteCacheResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).await.map_err(|e| {
            RouteCacheError::io(format!("creating directory {}", dir.display()), e)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_config() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            force: false,
            path: Some(temp.path().to_path_buf()),
        };
        execute(args).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join(LOCAL_CONFIG_NAME)).unwrap();
        assert!(content.contains("[policy]"));
        assert!(content.contains("[wrap]"));
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = toml::from_str(INIT_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.discovery.api_dir, "app/api");
        assert_eq!(config.policy.routes.len(), 12);
    }

    #[tokio::test]
    async fn init_refuses_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "existing").unwrap();

        let args = InitArgs {
            force: false,
            path: Some(temp.path().to_path_buf()),
        };
        let err = execute(args).await.unwrap_err().to_string();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn init_overwrites_with_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "old content").unwrap();

        let args = InitArgs {
            force: true,
            path: Some(temp.path().to_path_buf()),
        };
        execute(args).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join(LOCAL_CONFIG_NAME)).unwrap();
        assert!(!content.contains("old content"));
    }

    #[tokio::test]
    async fn init_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("web");

        let args = InitArgs {
            force: false,
            path: Some(nested.clone()),
        };
        execute(args).await.unwrap();
        assert!(nested.join(LOCAL_CONFIG_NAME).exists());
    }
}
