//! Route identifiers
//!
//! A `RoutePath` is the route file's path relative to the project root,
//! normalized to forward slashes without a leading `./`. It is the key for
//! policy lookup and the label used in reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Path of a route file relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath(String);

impl RoutePath {
    /// Build from a textual path, normalizing separators
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./").trim_start_matches('/');
        Self(trimmed.to_string())
    }

    /// Build from a filesystem path, relative to `root` when possible
    pub fn from_relative(root: &Path, path: &Path) -> Self {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let joined = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory segments of the route, excluding the file name
    fn dir_segments(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.0.split('/').filter(|s| !s.is_empty()).collect();
        parts.pop();
        parts
    }

    /// Segments below the last `api` directory (or all segments if none)
    fn api_segments(&self) -> Vec<&str> {
        let dirs = self.dir_segments();
        match dirs.iter().rposition(|s| *s == "api") {
            Some(idx) => dirs[idx + 1..].to_vec(),
            None => dirs,
        }
    }

    /// Dynamic parameter names, in path order.
    ///
    /// `[id]` yields `id`, `[...slug]` and `[[...slug]]` yield `slug`.
    pub fn dynamic_segments(&self) -> Vec<String> {
        self.api_segments()
            .into_iter()
            .filter_map(dynamic_param)
            .collect()
    }

    /// Static segments that name the resource, used to derive cache keys
    pub fn key_segments(&self) -> Vec<&str> {
        self.api_segments()
            .into_iter()
            .filter(|s| dynamic_param(s).is_none() && !is_route_group(s))
            .collect()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoutePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn dynamic_param(segment: &str) -> Option<String> {
    let inner = segment
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
        .or_else(|| segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')))?;
    let name = inner.trim_start_matches("...");
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn is_route_group(segment: &str) -> bool {
    segment.starts_with('(') && segment.ends_with(')')
}
