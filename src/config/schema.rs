//! Configuration schema for routecache
//!
//! Global configuration lives at `~/.config/routecache/config.toml`; a
//! project may override any part of it with `.routecache.toml` at its root.

use crate::error::RouteCacheError;
use crate::policy::{CacheTag, DurationRule, PolicyCatalog, PolicyStrategy, TagRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Route file discovery
    pub discovery: DiscoveryConfig,

    /// Policy tables
    pub policy: PolicyConfig,

    /// Which routes may be transformed
    pub eligibility: EligibilityConfig,

    /// Imports the rewritten code depends on
    pub imports: ImportsConfig,

    /// Query wrapping
    pub wrap: WrapConfig,
}

impl Config {
    /// Check invariants serde cannot express. Returns the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.discovery.route_file.trim().is_empty() {
            return Err("discovery.route_file must not be empty".to_string());
        }
        PolicyCatalog::from_config(&self.policy).map_err(|e| match e {
            RouteCacheError::PolicyInvalid(reason) => reason,
            other => other.to_string(),
        })?;
        if !is_identifier(&self.wrap.wrapper) {
            return Err(format!(
                "wrap.wrapper '{}' is not a valid identifier",
                self.wrap.wrapper
            ));
        }
        if !is_identifier(&self.wrap.tag_registry) {
            return Err(format!(
                "wrap.tag_registry '{}' is not a valid identifier",
                self.wrap.tag_registry
            ));
        }
        if self.wrap.clients.is_empty() {
            return Err("wrap.clients must list at least one client".to_string());
        }
        if let Some(client) = self.wrap.clients.iter().find(|c| !is_identifier(c)) {
            return Err(format!("wrap.clients: '{}' is not a valid identifier", client));
        }
        for import in &self.imports.required {
            if !is_identifier(&import.symbol) || import.module.trim().is_empty() {
                return Err(format!(
                    "imports.required: invalid entry '{}' from '{}'",
                    import.symbol, import.module
                ));
            }
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Route discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory, relative to the root, holding API routes
    pub api_dir: String,

    /// File name every route handler uses
    pub route_file: String,

    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_dir: "app/api".to_string(),
            route_file: "route.ts".to_string(),
            skip_dirs: vec![
                "node_modules".to_string(),
                ".next".to_string(),
                ".git".to_string(),
            ],
        }
    }
}

/// Policy resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// layered, table or keywords
    pub strategy: PolicyStrategy,

    /// Seconds used when no duration keyword matches
    pub default_revalidate: u32,

    /// Tag used when no tag keyword matches
    pub default_tag: CacheTag,

    /// Ordered duration keywords; more specific keywords first
    pub durations: Vec<DurationRule>,

    /// Ordered tag keywords; more specific keywords first
    pub tags: Vec<TagRule>,

    /// Exact per-route overrides keyed by root-relative path
    pub routes: BTreeMap<String, RoutePolicyConfig>,
}

/// A fully specified policy for one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicyConfig {
    pub tag: CacheTag,
    pub revalidate: u32,
    pub cache_key: String,
}

fn duration(keyword: &str, revalidate: u32) -> DurationRule {
    DurationRule {
        keyword: keyword.to_string(),
        revalidate,
    }
}

fn tag(keyword: &str, tag: CacheTag) -> TagRule {
    TagRule {
        keyword: keyword.to_string(),
        tag,
    }
}

fn route(tag: CacheTag, revalidate: u32, cache_key: &str) -> RoutePolicyConfig {
    RoutePolicyConfig {
        tag,
        revalidate,
        cache_key: cache_key.to_string(),
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let routes = [
            ("app/api/search/tickets/route.ts", route(CacheTag::Tickets, 60, "search-tickets")),
            ("app/api/search/users/route.ts", route(CacheTag::Users, 60, "search-users")),
            ("app/api/search/assets/route.ts", route(CacheTag::Assets, 60, "search-assets")),
            ("app/api/search/services/route.ts", route(CacheTag::Services, 60, "search-services")),
            (
                "app/api/search/suggestions/route.ts",
                route(CacheTag::Tickets, 60, "search-suggestions"),
            ),
            ("app/api/assets/route.ts", route(CacheTag::Assets, 300, "assets")),
            ("app/api/asset-types/route.ts", route(CacheTag::Assets, 3600, "asset-types")),
            ("app/api/users/[id]/route.ts", route(CacheTag::Users, 300, "user")),
            ("app/api/profiles/route.ts", route(CacheTag::Users, 300, "profiles")),
            (
                "app/api/service-categories/route.ts",
                route(CacheTag::Services, 3600, "service-categories"),
            ),
            (
                "app/api/services/requestable/route.ts",
                route(CacheTag::Services, 300, "services-requestable"),
            ),
            ("app/api/check-config/route.ts", route(CacheTag::Tickets, 3600, "check-config")),
        ]
        .into_iter()
        .map(|(path, policy)| (path.to_string(), policy))
        .collect();

        Self {
            strategy: PolicyStrategy::Layered,
            default_revalidate: 300,
            default_tag: CacheTag::General,
            durations: vec![
                duration("search", 60),
                duration("service-requests", 60),
                duration("service-categories", 3600),
                duration("asset-types", 3600),
                duration("dashboard", 300),
                duration("assets", 300),
                duration("users", 300),
                duration("profiles", 300),
                duration("analytics", 300),
                duration("notifications", 60),
                duration("teams", 300),
                duration("accounts", 300),
                duration("knowledge", 3600),
            ],
            tags: vec![
                tag("ticket", CacheTag::Tickets),
                tag("service-request", CacheTag::ServiceRequests),
                tag("asset", CacheTag::Assets),
                tag("user", CacheTag::Users),
                tag("profile", CacheTag::Users),
                tag("dashboard", CacheTag::Dashboard),
                tag("analytics", CacheTag::Analytics),
                tag("notification", CacheTag::Notifications),
                tag("team", CacheTag::Teams),
                tag("account", CacheTag::Accounts),
                tag("knowledge", CacheTag::KnowledgeBase),
                tag("service", CacheTag::Services),
            ],
            routes,
        }
    }
}

/// Route eligibility settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Path substrings that exclude a route (auth and mutation endpoints)
    pub excluded: Vec<String>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            excluded: vec![
                "auth/".to_string(),
                "create-".to_string(),
                "token-sync".to_string(),
                "reset-password".to_string(),
            ],
        }
    }
}

/// A symbol the rewritten code needs, and the module that exports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredImport {
    pub symbol: String,
    pub module: String,
}

/// Import insertion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsConfig {
    /// Module whose import statement marks the insertion point
    pub anchor_module: String,

    /// Imports to ensure, in insertion order
    pub required: Vec<RequiredImport>,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            anchor_module: "next/server".to_string(),
            required: vec![
                RequiredImport {
                    symbol: "unstable_cache".to_string(),
                    module: "next/cache".to_string(),
                },
                RequiredImport {
                    symbol: "CACHE_TAGS".to_string(),
                    module: "@/lib/cache".to_string(),
                },
            ],
        }
    }
}

/// Query wrapping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapConfig {
    /// Rewrite matched queries (false = only add imports)
    pub enabled: bool,

    /// Caching function the query is routed through
    pub wrapper: String,

    /// Object exposing the tag constants
    pub tag_registry: String,

    /// Identifiers a data-fetch chain may be rooted at
    pub clients: Vec<String>,

    /// Identifier holding dynamic route parameters
    pub params_ident: String,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wrapper: "unstable_cache".to_string(),
            tag_registry: "CACHE_TAGS".to_string(),
            clients: vec![
                "supabase".to_string(),
                "client".to_string(),
                "query".to_string(),
            ],
            params_ident: "params".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[discovery]"));
        assert!(toml.contains("[[policy.durations]]"));
        assert!(toml.contains("app/api/users/[id]/route.ts"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.discovery.route_file, "route.ts");
        assert_eq!(config.wrap.wrapper, "unstable_cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [policy]
            strategy = "keywords"
            default_tag = "dashboard"

            [[policy.durations]]
            keyword = "reports"
            revalidate = 900
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.policy.strategy, PolicyStrategy::Keywords);
        assert_eq!(config.policy.default_tag, CacheTag::Dashboard);
        assert_eq!(config.policy.durations, vec![duration("reports", 900)]);
        // untouched sections keep defaults
        assert_eq!(config.policy.default_revalidate, 300);
        assert_eq!(config.imports.anchor_module, "next/server");
    }

    #[test]
    fn default_config_roundtrips() {
        let toml = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.policy.routes, Config::default().policy.routes);
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let mut config = Config::default();
        config.policy.durations.push(duration("reports", 0));
        assert!(config.validate().unwrap_err().contains("reports"));
    }

    #[test]
    fn validate_rejects_zero_default_and_empty_keyword() {
        let mut config = Config::default();
        config.policy.default_revalidate = 0;
        assert!(config.validate().unwrap_err().contains("default_revalidate"));

        let mut config = Config::default();
        config.policy.tags.push(tag("", CacheTag::Teams));
        assert!(config.validate().unwrap_err().contains("policy.tags"));
    }

    #[test]
    fn validate_rejects_bad_wrapper() {
        let mut config = Config::default();
        config.wrap.wrapper = "unstable cache".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_cache_key() {
        let mut config = Config::default();
        config
            .policy
            .routes
            .insert("app/api/x/route.ts".to_string(), route(CacheTag::Users, 60, " "));
        assert!(config.validate().unwrap_err().contains("cache_key"));
    }
}
