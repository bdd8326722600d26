//! Policy command - show the caching policy resolved for routes

use crate::cli::args::{OutputFormat, PolicyArgs};
use crate::config::Config;
use crate::error::RouteCacheResult;
use crate::policy::{CachePolicy, PolicyCatalog};
use crate::route::RoutePath;
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PolicyReport {
    route: RoutePath,
    #[serde(flatten)]
    policy: CachePolicy,
    tag_expression: String,
}

/// Execute the policy command
pub async fn execute(args: PolicyArgs, config: &Config) -> RouteCacheResult<()> {
    let ctx = UiContext::detect().with_plain(args.format.is_machine());

    let mut catalog = PolicyCatalog::from_config(&config.policy)?;
    if let Some(strategy) = args.strategy {
        catalog = catalog.with_strategy(strategy);
    }

    let reports: Vec<PolicyReport> = args
        .routes
        .iter()
        .map(|raw| {
            let route = RoutePath::new(raw);
            let policy = catalog.resolve(&route);
            PolicyReport {
                tag_expression: policy.tag.expression(&config.wrap.tag_registry),
                route,
                policy,
            }
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Plain => {
            for r in &reports {
                println!(
                    "{}\t{}\t{}\t{}",
                    r.route, r.policy.tag, r.policy.revalidate_secs, r.policy.cache_key_base
                );
            }
        }
        OutputFormat::Table => {
            ui::step_info(&ctx, &format!("Policy strategy: {}", catalog.strategy()));
            for r in &reports {
                println!();
                println!("{}", r.route);
                ui::key_value(&ctx, "tag", &r.tag_expression);
                ui::key_value(&ctx, "revalidate", &format!("{}s", r.policy.revalidate_secs));
                ui::key_value(&ctx, "cache key", &r.policy.cache_key_base);
            }
        }
    }

    Ok(())
}
