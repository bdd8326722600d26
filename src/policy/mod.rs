//! Caching policies for route handlers
//!
//! A `CachePolicy` says how long a route's data may be served from cache,
//! which tag invalidates it, and which namespace its cache keys live in.
//! Policies are derived from the route path alone by [`PolicyCatalog`].

pub mod catalog;

pub use catalog::{DurationRule, PolicyCatalog, PolicyStrategy, TagRule};

use crate::error::RouteCacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Invalidation tags known to the target application's tag registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheTag {
    Tickets,
    Users,
    Services,
    ServiceRequests,
    Assets,
    Dashboard,
    Analytics,
    Notifications,
    Teams,
    Accounts,
    KnowledgeBase,
    /// Fallback tag; not a registry member downstream
    General,
}

impl CacheTag {
    /// Property name on the registry object, `None` for `General`
    pub fn registry_member(&self) -> Option<&'static str> {
        match self {
            Self::Tickets => Some("tickets"),
            Self::Users => Some("users"),
            Self::Services => Some("services"),
            Self::ServiceRequests => Some("serviceRequests"),
            Self::Assets => Some("assets"),
            Self::Dashboard => Some("dashboard"),
            Self::Analytics => Some("analytics"),
            Self::Notifications => Some("notifications"),
            Self::Teams => Some("teams"),
            Self::Accounts => Some("accounts"),
            Self::KnowledgeBase => Some("knowledgeBase"),
            Self::General => None,
        }
    }

    /// Source expression for this tag, e.g. `CACHE_TAGS.users` or `'general'`
    pub fn expression(&self, registry: &str) -> String {
        match self.registry_member() {
            Some(member) => format!("{}.{}", registry, member),
            None => format!("'{}'", self),
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::Tickets,
            Self::Users,
            Self::Services,
            Self::ServiceRequests,
            Self::Assets,
            Self::Dashboard,
            Self::Analytics,
            Self::Notifications,
            Self::Teams,
            Self::Accounts,
            Self::KnowledgeBase,
            Self::General,
        ]
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tickets => "tickets",
            Self::Users => "users",
            Self::Services => "services",
            Self::ServiceRequests => "service-requests",
            Self::Assets => "assets",
            Self::Dashboard => "dashboard",
            Self::Analytics => "analytics",
            Self::Notifications => "notifications",
            Self::Teams => "teams",
            Self::Accounts => "accounts",
            Self::KnowledgeBase => "knowledge-base",
            Self::General => "general",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CacheTag {
    type Err = RouteCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|tag| tag.to_string() == s || tag.registry_member() == Some(s))
            .ok_or_else(|| RouteCacheError::UnknownTag(s.to_string()))
    }
}

/// Caching decision for one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachePolicy {
    pub tag: CacheTag,
    pub revalidate_secs: u32,
    pub cache_key_base: String,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tag={} revalidate={}s key={}",
            self.tag, self.revalidate_secs, self.cache_key_base
        )
    }
}
