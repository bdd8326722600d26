//! Eligibility checks for route files
//!
//! Checked in order, first hit wins:
//! 1. Excluded path substring (auth, password reset, create endpoints)
//! 2. No GET handler declared
//! 3. Wrapper call already present
//!
//! Path exclusion runs before any content inspection.

use crate::error::{RouteCacheError, RouteCacheResult};
use crate::route::RoutePath;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static GET_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*export\s+(?:(?:async\s+)?function\s+GET\s*[(<]|(?:const|let)\s+GET\s*[:=])",
    )
    .unwrap()
});

/// Why a route is not transformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    /// Path matched an excluded substring
    Excluded { pattern: String },
    NoGetHandler,
    AlreadyCached,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded { pattern } => write!(f, "excluded by policy ({})", pattern),
            Self::NoGetHandler => write!(f, "no GET handler"),
            Self::AlreadyCached => write!(f, "already cached"),
        }
    }
}

/// Classification of a route file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(Ineligible),
}

/// Decides whether a route file should be transformed at all
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    excluded: Vec<String>,
    wrapper_call: Regex,
}

impl EligibilityFilter {
    pub fn new(excluded: Vec<String>, wrapper: &str) -> RouteCacheResult<Self> {
        Ok(Self {
            excluded,
            wrapper_call: wrapper_call_regex(wrapper)?,
        })
    }

    /// Classify a route by its path and content
    pub fn classify(&self, route: &RoutePath, content: &str) -> Eligibility {
        if let Some(pattern) = self.excluded_by(route) {
            return Eligibility::Ineligible(Ineligible::Excluded {
                pattern: pattern.to_string(),
            });
        }

        if !has_get_handler(content) {
            return Eligibility::Ineligible(Ineligible::NoGetHandler);
        }

        if self.is_cached(content) {
            return Eligibility::Ineligible(Ineligible::AlreadyCached);
        }

        Eligibility::Eligible
    }

    /// First excluded substring contained in the route path
    pub fn excluded_by(&self, route: &RoutePath) -> Option<&str> {
        self.excluded
            .iter()
            .find(|pattern| route.as_str().contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Whether the content already calls the caching wrapper
    pub fn is_cached(&self, content: &str) -> bool {
        self.wrapper_call.is_match(content)
    }
}

/// Whether the content declares an exported GET handler
pub fn has_get_handler(content: &str) -> bool {
    GET_HANDLER.is_match(content)
}

/// Regex matching a call to `wrapper`, e.g. `unstable_cache(`
pub(crate) fn wrapper_call_regex(wrapper: &str) -> RouteCacheResult<Regex> {
    Regex::new(&format!(r"(?:^|[^\w$.]){}\s*\(", regex::escape(wrapper)))
        .map_err(|e| RouteCacheError::Internal(format!("wrapper pattern: {}", e)))
}
