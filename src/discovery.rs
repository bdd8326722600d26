//! Route file discovery
//!
//! Walks `{root}/{api_dir}` recursively and collects every file named like
//! the configured route file (`route.ts`). Results are sorted by route path
//! so runs are reproducible.

use crate::config::schema::DiscoveryConfig;
use crate::error::{RouteCacheError, RouteCacheResult};
use crate::route::RoutePath;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A route file found under the project root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RouteFile {
    /// Root-relative route identifier
    pub route: RoutePath,
    /// Path on disk
    pub path: PathBuf,
}

impl RouteFile {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        Self {
            route: RoutePath::from_relative(root, &path),
            path,
        }
    }
}

/// Find all route files under `root`
pub fn discover_routes(root: &Path, config: &DiscoveryConfig) -> RouteCacheResult<Vec<RouteFile>> {
    if !root.is_dir() {
        return Err(RouteCacheError::RootNotFound(root.to_path_buf()));
    }

    let api_dir = root.join(&config.api_dir);
    if !api_dir.is_dir() {
        return Err(RouteCacheError::ApiDirNotFound(api_dir));
    }

    let walker = WalkDir::new(&api_dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && config
                    .skip_dirs
                    .iter()
                    .any(|skip| entry.file_name().to_string_lossy() == skip.as_str()))
        });

    let mut routes = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy() != config.route_file.as_str() {
            continue;
        }
        routes.push(RouteFile::new(root, entry.into_path()));
    }

    routes.sort();
    debug!("Discovered {} route file(s) under {}", routes.len(), api_dir.display());
    Ok(routes)
}
