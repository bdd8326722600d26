//! Route path to caching policy resolution
//!
//! Two tiers, both driven by configuration data:
//! 1. Exact table: `app/api/search/tickets/route.ts` -> fully specified policy
//! 2. Keyword inference: ordered `(keyword, duration)` and `(keyword, tag)`
//!    rules matched as substrings of the route path, first match wins
//!
//! Unknown routes never fail; they get the default duration and tag.

use super::{CachePolicy, CacheTag};
use crate::config::schema::PolicyConfig;
use crate::error::{RouteCacheError, RouteCacheResult};
use crate::route::RoutePath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which tiers of the catalog are consulted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStrategy {
    /// Exact table first, keyword inference as fallback
    #[default]
    Layered,
    /// Exact table only; unlisted routes get the defaults
    Table,
    /// Keyword inference only
    Keywords,
}

impl fmt::Display for PolicyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Layered => "layered",
            Self::Table => "table",
            Self::Keywords => "keywords",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PolicyStrategy {
    type Err = RouteCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layered" => Ok(Self::Layered),
            "table" => Ok(Self::Table),
            "keywords" => Ok(Self::Keywords),
            other => Err(RouteCacheError::User(format!(
                "unknown policy strategy '{}' (expected layered, table or keywords)",
                other
            ))),
        }
    }
}

/// Duration rule: routes containing `keyword` revalidate every `revalidate` seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRule {
    pub keyword: String,
    pub revalidate: u32,
}

/// Tag rule: routes containing `keyword` are invalidated by `tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub keyword: String,
    pub tag: CacheTag,
}

/// Resolves a route to its caching policy
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    strategy: PolicyStrategy,
    routes: HashMap<RoutePath, CachePolicy>,
    durations: Vec<DurationRule>,
    tags: Vec<TagRule>,
    default_revalidate: u32,
    default_tag: CacheTag,
}

impl PolicyCatalog {
    /// Create a catalog from explicit rule sets
    pub fn new(
        routes: HashMap<RoutePath, CachePolicy>,
        durations: Vec<DurationRule>,
        tags: Vec<TagRule>,
        default_revalidate: u32,
        default_tag: CacheTag,
    ) -> RouteCacheResult<Self> {
        if default_revalidate == 0 {
            return Err(RouteCacheError::PolicyInvalid(
                "policy.default_revalidate must be positive".to_string(),
            ));
        }
        if let Some(rule) = durations.iter().find(|r| r.revalidate == 0) {
            return Err(RouteCacheError::PolicyInvalid(format!(
                "policy.durations: revalidate for '{}' must be positive",
                rule.keyword
            )));
        }
        if let Some(rule) = durations.iter().find(|r| r.keyword.is_empty()) {
            return Err(RouteCacheError::PolicyInvalid(format!(
                "policy.durations: keyword must not be empty ({}s rule)",
                rule.revalidate
            )));
        }
        if tags.iter().any(|r| r.keyword.is_empty()) {
            return Err(RouteCacheError::PolicyInvalid(
                "policy.tags: keyword must not be empty".to_string(),
            ));
        }
        for (route, policy) in &routes {
            if policy.revalidate_secs == 0 {
                return Err(RouteCacheError::PolicyInvalid(format!(
                    "policy.routes.\"{}\": revalidate must be positive",
                    route
                )));
            }
            if policy.cache_key_base.trim().is_empty() {
                return Err(RouteCacheError::PolicyInvalid(format!(
                    "policy.routes.\"{}\": cache_key must not be empty",
                    route
                )));
            }
        }

        Ok(Self {
            strategy: PolicyStrategy::default(),
            routes,
            durations,
            tags,
            default_revalidate,
            default_tag,
        })
    }

    /// Build the catalog from the `[policy]` config section
    pub fn from_config(config: &PolicyConfig) -> RouteCacheResult<Self> {
        let routes = config
            .routes
            .iter()
            .map(|(path, entry)| {
                (
                    RoutePath::new(path),
                    CachePolicy {
                        tag: entry.tag,
                        revalidate_secs: entry.revalidate,
                        cache_key_base: entry.cache_key.clone(),
                    },
                )
            })
            .collect();

        Ok(Self::new(
            routes,
            config.durations.clone(),
            config.tags.clone(),
            config.default_revalidate,
            config.default_tag,
        )?
        .with_strategy(config.strategy))
    }

    /// Override the resolution strategy
    pub fn with_strategy(mut self, strategy: PolicyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> PolicyStrategy {
        self.strategy
    }

    /// Resolve the policy for a route. Pure: same route, same policy.
    pub fn resolve(&self, route: &RoutePath) -> CachePolicy {
        if self.strategy != PolicyStrategy::Keywords {
            if let Some(policy) = self.routes.get(route) {
                debug!("Policy for {} from exact table: {}", route, policy);
                return policy.clone();
            }
        }

        let policy = match self.strategy {
            PolicyStrategy::Table => CachePolicy {
                tag: self.default_tag,
                revalidate_secs: self.default_revalidate,
                cache_key_base: infer_cache_key(route),
            },
            PolicyStrategy::Layered | PolicyStrategy::Keywords => CachePolicy {
                tag: self.infer_tag(route),
                revalidate_secs: self.infer_duration(route),
                cache_key_base: infer_cache_key(route),
            },
        };
        debug!("Policy for {} inferred: {}", route, policy);
        policy
    }

    fn infer_duration(&self, route: &RoutePath) -> u32 {
        self.durations
            .iter()
            .find(|rule| route.as_str().contains(rule.keyword.as_str()))
            .map(|rule| rule.revalidate)
            .unwrap_or(self.default_revalidate)
    }

    fn infer_tag(&self, route: &RoutePath) -> CacheTag {
        self.tags
            .iter()
            .find(|rule| route.as_str().contains(rule.keyword.as_str()))
            .map(|rule| rule.tag)
            .unwrap_or(self.default_tag)
    }
}

/// Cache key namespace from the route's static segments, e.g. `search-tickets`
fn infer_cache_key(route: &RoutePath) -> String {
    let segments = route.key_segments();
    if segments.is_empty() {
        "api".to_string()
    } else {
        segments.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PolicyConfig;

    fn default_catalog() -> PolicyCatalog {
        PolicyCatalog::from_config(&PolicyConfig::default()).unwrap()
    }

    fn synthetic(strategy: PolicyStrategy) -> PolicyCatalog {
        let mut routes = HashMap::new();
        routes.insert(
            RoutePath::new("app/api/reports/route.ts"),
            CachePolicy {
                tag: CacheTag::Analytics,
                revalidate_secs: 900,
                cache_key_base: "reports-v2".to_string(),
            },
        );
        PolicyCatalog::new(
            routes,
            vec![
                DurationRule {
                    keyword: "service-request".to_string(),
                    revalidate: 60,
                },
                DurationRule {
                    keyword: "service".to_string(),
                    revalidate: 3600,
                },
            ],
            vec![
                TagRule {
                    keyword: "service-request".to_string(),
                    tag: CacheTag::ServiceRequests,
                },
                TagRule {
                    keyword: "service".to_string(),
                    tag: CacheTag::Services,
                },
            ],
            300,
            CacheTag::General,
        )
        .unwrap()
        .with_strategy(strategy)
    }

    #[test]
    fn resolve_is_pure() {
        let catalog = default_catalog();
        let route = RoutePath::new("app/api/teams/[id]/members/route.ts");
        assert_eq!(catalog.resolve(&route), catalog.resolve(&route));
        assert_eq!(default_catalog().resolve(&route), catalog.resolve(&route));
    }

    #[test]
    fn specific_keyword_wins_over_generic() {
        let catalog = synthetic(PolicyStrategy::Keywords);
        let policy = catalog.resolve(&RoutePath::new("app/api/service-requests/route.ts"));
        assert_eq!(policy.tag, CacheTag::ServiceRequests);
        assert_eq!(policy.revalidate_secs, 60);

        let policy = catalog.resolve(&RoutePath::new("app/api/services/route.ts"));
        assert_eq!(policy.tag, CacheTag::Services);
        assert_eq!(policy.revalidate_secs, 3600);
    }

    #[test]
    fn default_rules_prefer_service_requests() {
        let policy = default_catalog().resolve(&RoutePath::new(
            "app/api/service-requests/[id]/route.ts",
        ));
        assert_eq!(policy.tag, CacheTag::ServiceRequests);
        assert_eq!(policy.revalidate_secs, 60);
        assert_eq!(policy.cache_key_base, "service-requests");
    }

    #[test]
    fn unknown_route_gets_defaults() {
        let policy = default_catalog().resolve(&RoutePath::new("app/api/widgets/route.ts"));
        assert_eq!(policy.tag, CacheTag::General);
        assert_eq!(policy.revalidate_secs, 300);
        assert_eq!(policy.cache_key_base, "widgets");
    }

    #[test]
    fn exact_table_overrides_inference() {
        let policy = default_catalog().resolve(&RoutePath::new("app/api/users/[id]/route.ts"));
        assert_eq!(policy.tag, CacheTag::Users);
        assert_eq!(policy.revalidate_secs, 300);
        assert_eq!(policy.cache_key_base, "user");

        let policy = default_catalog().resolve(&RoutePath::new("app/api/search/users/route.ts"));
        assert_eq!(policy.revalidate_secs, 60);
        assert_eq!(policy.cache_key_base, "search-users");
    }

    #[test]
    fn keywords_strategy_ignores_table() {
        let catalog = synthetic(PolicyStrategy::Keywords);
        let policy = catalog.resolve(&RoutePath::new("app/api/reports/route.ts"));
        assert_eq!(policy.tag, CacheTag::General);
        assert_eq!(policy.cache_key_base, "reports");
    }

    #[test]
    fn table_strategy_skips_inference() {
        let catalog = synthetic(PolicyStrategy::Table);
        let listed = catalog.resolve(&RoutePath::new("app/api/reports/route.ts"));
        assert_eq!(listed.cache_key_base, "reports-v2");

        let unlisted = catalog.resolve(&RoutePath::new("app/api/services/route.ts"));
        assert_eq!(unlisted.tag, CacheTag::General);
        assert_eq!(unlisted.revalidate_secs, 300);
    }

    #[test]
    fn search_keyword_agrees_with_table() {
        let catalog = default_catalog().with_strategy(PolicyStrategy::Keywords);
        let policy = catalog.resolve(&RoutePath::new("app/api/search/assets/route.ts"));
        assert_eq!(policy.revalidate_secs, 60);
        assert_eq!(policy.tag, CacheTag::Assets);
    }

    #[test]
    fn rejects_zero_durations() {
        let err = PolicyCatalog::new(
            HashMap::new(),
            vec![DurationRule {
                keyword: "x".to_string(),
                revalidate: 0,
            }],
            vec![],
            300,
            CacheTag::General,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn strategy_parses() {
        assert_eq!(
            "keywords".parse::<PolicyStrategy>().unwrap(),
            PolicyStrategy::Keywords
        );
        assert!("fuzzy".parse::<PolicyStrategy>().is_err());
    }
}
