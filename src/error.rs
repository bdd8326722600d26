//! Error types for routecache
//!
//! All modules use `RouteCacheResult<T>` as their return type. Per-file
//! transformation outcomes are data (`TransformResult`), never errors; only
//! configuration problems and I/O failures surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for routecache operations
pub type RouteCacheResult<T> = Result<T, RouteCacheError>;

/// All errors that can occur in routecache
#[derive(Error, Debug)]
pub enum RouteCacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid policy rule: {0}")]
    PolicyInvalid(String),

    #[error("Unknown cache tag: {0}")]
    UnknownTag(String),

    // Discovery errors
    #[error("Route root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("API directory not found under root: {0}")]
    ApiDirNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RouteCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: routecache config show"),
            Self::ApiDirNotFound(_) => {
                Some("Pass --root pointing at the app directory, or set discovery.api_dir")
            }
            Self::UnknownTag(_) => Some(
                "Valid tags: tickets, users, services, service-requests, assets, dashboard, \
                 analytics, notifications, teams, accounts, knowledge-base, general",
            ),
            _ => None,
        }
    }
}
