//! Apply command - add caching to route handlers
//!
//! Reads every route file, runs the pure transformation pipeline, asks
//! before writing (interactive only) and prints the run summary. Per-file
//! failures never abort the batch; they are counted and reported.

use crate::cli::args::{ApplyArgs, OutputFormat};
use crate::config::Config;
use crate::discovery::{discover_routes, RouteFile};
use crate::error::{RouteCacheError, RouteCacheResult};
use crate::policy::CachePolicy;
use crate::report::Summary;
use crate::route::RoutePath;
use crate::transform::{FileOutcome, TransformResult, Transformer};
use crate::ui::{self, FileProgress, UiContext};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Per-file entry of the JSON report
#[derive(Debug, Serialize)]
struct FileReport<'a> {
    route: &'a RoutePath,
    result: TransformResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy: Option<&'a CachePolicy>,
    written: bool,
}

/// Execute the apply command
pub async fn execute(args: ApplyArgs, config: &Config) -> RouteCacheResult<()> {
    let ctx = UiContext::detect()
        .with_auto_yes(args.yes)
        .with_plain(args.format.is_machine());

    let root = resolve_root(args.root.as_deref())?;

    let mut transformer = Transformer::from_config(config)?;
    if let Some(strategy) = args.strategy {
        transformer = transformer.with_strategy(strategy);
    }
    if args.imports_only {
        transformer = transformer.with_wrapping(false);
    }

    ui::intro(&ctx, "routecache");
    ui::step_info(
        &ctx,
        &format!(
            "Policy strategy: {}{}",
            transformer.catalog().strategy(),
            if args.imports_only { " (imports only)" } else { "" }
        ),
    );

    let files = collect_files(&ctx, &root, &args.paths, config)?;
    info!("Processing {} route file(s) under {}", files.len(), root.display());

    let mut summary = Summary::new(args.dry_run);
    let mut failed: Vec<(RoutePath, String)> = Vec::new();
    let mut outcomes: Vec<(RouteFile, FileOutcome)> = Vec::with_capacity(files.len());

    let progress = FileProgress::new(&ctx, files.len() as u64);
    for file in files {
        progress.advance(file.route.as_str());
        match fs::read_to_string(&file.path).await {
            Ok(content) => {
                let outcome = transformer.transform(&file.route, &content);
                debug!("{}: {}", file.route, outcome.result);
                outcomes.push((file, outcome));
            }
            Err(e) => {
                warn!("Failed to read {}: {}", file.path.display(), e);
                summary.record_error(&file.route);
                failed.push((file.route, e.to_string()));
            }
        }
    }
    progress.finish();

    let pending = outcomes.iter().filter(|(_, o)| o.changed()).count();
    let write = !args.dry_run
        && pending > 0
        && ui::confirm(&ctx, &format!("Write {} changed file(s)?", pending), true).await?;
    if !args.dry_run && pending > 0 && !write {
        ui::step_warn_hint(&ctx, "No files written", "confirmation declined");
        summary.dry_run = true;
    }

    ui::section(&ctx, "Routes");
    let mut reports = Vec::with_capacity(outcomes.len());
    for (file, outcome) in &outcomes {
        let mut written = false;
        if write {
            if let Some(ref content) = outcome.content {
                if let Err(e) = fs::write(&file.path, content).await {
                    warn!("Failed to write {}: {}", file.path.display(), e);
                    summary.record_error(&file.route);
                    failed.push((file.route.clone(), e.to_string()));
                    continue;
                }
                written = true;
            }
        }

        summary.record(&file.route, outcome.result);
        print_outcome(&ctx, args.format, outcome);
        reports.push(FileReport {
            route: &outcome.route,
            result: outcome.result,
            reason: outcome.reason.as_deref(),
            policy: outcome.policy.as_ref(),
            written,
        });
    }

    for (route, reason) in &failed {
        ui::step_error_detail(&ctx, route.as_str(), reason);
    }

    match args.format {
        OutputFormat::Json => {
            let mut json = summary.to_json(Utc::now());
            json["files"] = serde_json::to_value(&reports)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for line in summary.render_lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Table => {
            println!();
            for line in summary.render_lines() {
                println!("{}", line);
            }
            if summary.needs_manual > 0 || summary.errors > 0 {
                ui::outro_warn(&ctx, "Some routes need attention");
            } else if summary.dry_run {
                ui::outro_success(&ctx, "Dry run complete");
            } else {
                ui::outro_success(&ctx, "Done");
            }
        }
    }

    Ok(())
}

/// Root directory of the project, defaulting to the current directory
fn resolve_root(root: Option<&Path>) -> RouteCacheResult<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| RouteCacheError::io("getting current directory", e))?,
    };
    if !root.is_dir() {
        return Err(RouteCacheError::RootNotFound(root));
    }
    Ok(root)
}

/// Explicit paths when given (relative ones resolve against the root),
/// otherwise every route file discovered under the API directory
fn collect_files(
    ctx: &UiContext,
    root: &Path,
    paths: &[PathBuf],
    config: &Config,
) -> RouteCacheResult<Vec<RouteFile>> {
    if paths.is_empty() {
        return discover_routes(root, &config.discovery);
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let full = if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        };
        if !full.is_file() {
            warn!("Route file not found: {}", full.display());
            ui::step_warn_hint(ctx, &path.display().to_string(), "file not found, skipped");
            continue;
        }
        files.push(RouteFile::new(root, full));
    }
    Ok(files)
}

fn print_outcome(ctx: &UiContext, format: OutputFormat, outcome: &FileOutcome) {
    let route = outcome.route.as_str();
    let reason = outcome.reason.as_deref().unwrap_or("");

    if format == OutputFormat::Plain {
        println!("{}\t{}", outcome.result, route);
        return;
    }

    if outcome.result.is_success() {
        let detail = match outcome.policy {
            Some(ref policy) => format!("{}; {}", outcome.result, policy),
            None => outcome.result.to_string(),
        };
        ui::step_ok_detail(ctx, route, &detail);
        if outcome.result == TransformResult::ImportsAdded && !reason.is_empty() {
            ui::remark(ctx, reason);
        }
    } else if outcome.result.is_skip() {
        ui::remark(ctx, &format!("{} ({})", route, outcome.result));
    } else {
        ui::step_warn_hint(ctx, route, reason);
    }
}
