//! Per-file transformation pipeline
//!
//! `classify -> resolve policy -> ensure imports -> wrap query`. Every stage
//! takes the document by reference and returns a new value, so the driver
//! decides whether anything is written. No I/O happens here.

pub mod eligibility;
pub mod imports;
pub mod query;

pub use eligibility::{Eligibility, EligibilityFilter, Ineligible};
pub use imports::ImportRewriter;
pub use query::{QueryShape, QueryWrapper, WrapOutcome};

use crate::config::Config;
use crate::error::RouteCacheResult;
use crate::policy::{CachePolicy, PolicyCatalog, PolicyStrategy};
use crate::route::RoutePath;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// A document after one rewriting stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub changed: bool,
}

impl Rewrite {
    pub fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            changed: false,
        }
    }
}

/// Terminal state of one file in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformResult {
    AlreadyCached,
    Excluded,
    NoGetHandler,
    ImportsAdded,
    NeedsManualReview,
    Wrapped,
}

impl TransformResult {
    /// Whether the file was (or would be) modified towards caching
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Wrapped | Self::ImportsAdded)
    }

    /// Whether the file was left alone as an expected steady state
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::AlreadyCached | Self::Excluded | Self::NoGetHandler)
    }
}

impl fmt::Display for TransformResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlreadyCached => "already cached",
            Self::Excluded => "excluded",
            Self::NoGetHandler => "no GET handler",
            Self::ImportsAdded => "imports added",
            Self::NeedsManualReview => "needs manual review",
            Self::Wrapped => "wrapped",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of transforming one route file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub route: RoutePath,
    pub result: TransformResult,
    pub reason: Option<String>,
    /// Policy applied, when the file got past eligibility
    pub policy: Option<CachePolicy>,
    /// New content, present only when it differs from the input
    pub content: Option<String>,
}

impl FileOutcome {
    fn skipped(route: &RoutePath, result: TransformResult, reason: String) -> Self {
        Self {
            route: route.clone(),
            result,
            reason: Some(reason),
            policy: None,
            content: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.content.is_some()
    }
}

/// Runs the eligibility, policy, import and wrapping stages for one file
#[derive(Debug, Clone)]
pub struct Transformer {
    catalog: PolicyCatalog,
    filter: EligibilityFilter,
    imports: ImportRewriter,
    wrapper: QueryWrapper,
    wrap_enabled: bool,
}

impl Transformer {
    pub fn new(
        catalog: PolicyCatalog,
        filter: EligibilityFilter,
        imports: ImportRewriter,
        wrapper: QueryWrapper,
    ) -> Self {
        Self {
            catalog,
            filter,
            imports,
            wrapper,
            wrap_enabled: true,
        }
    }

    /// Build every stage from configuration
    pub fn from_config(config: &Config) -> RouteCacheResult<Self> {
        let transformer = Self::new(
            PolicyCatalog::from_config(&config.policy)?,
            EligibilityFilter::new(config.eligibility.excluded.clone(), &config.wrap.wrapper)?,
            ImportRewriter::new(&config.imports.anchor_module, config.imports.required.clone())?,
            QueryWrapper::new(&config.wrap)?,
        );
        Ok(transformer.with_wrapping(config.wrap.enabled))
    }

    /// Override the policy strategy
    pub fn with_strategy(mut self, strategy: PolicyStrategy) -> Self {
        self.catalog = self.catalog.with_strategy(strategy);
        self
    }

    /// Enable or disable query wrapping (imports are always ensured)
    pub fn with_wrapping(mut self, enabled: bool) -> Self {
        self.wrap_enabled = enabled;
        self
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Transform one file's content
    pub fn transform(&self, route: &RoutePath, content: &str) -> FileOutcome {
        if let Eligibility::Ineligible(why) = self.filter.classify(route, content) {
            let result = match why {
                Ineligible::Excluded { .. } => TransformResult::Excluded,
                Ineligible::NoGetHandler => TransformResult::NoGetHandler,
                Ineligible::AlreadyCached => TransformResult::AlreadyCached,
            };
            debug!("{}: {}", route, why);
            return FileOutcome::skipped(route, result, why.to_string());
        }

        let policy = self.catalog.resolve(route);
        let imported = self.imports.ensure_imports(content);

        let (result, reason, text) = if !self.wrap_enabled {
            if imported.changed {
                (TransformResult::ImportsAdded, None, imported.content)
            } else {
                (
                    TransformResult::NeedsManualReview,
                    Some("imports present; wrap the query manually".to_string()),
                    imported.content,
                )
            }
        } else if !self.imports.missing(&imported.content).is_empty() {
            let missing = self
                .imports
                .missing(&imported.content)
                .iter()
                .map(|i| i.symbol.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            (
                TransformResult::NeedsManualReview,
                Some(format!("required imports missing: {}", missing)),
                imported.content,
            )
        } else {
            match self.wrapper.try_wrap(&imported.content, route, &policy) {
                WrapOutcome::Wrapped { content, shape } => (
                    TransformResult::Wrapped,
                    Some(format!("{} query", shape)),
                    content,
                ),
                WrapOutcome::AlreadyWrapped => (
                    TransformResult::AlreadyCached,
                    Some("already cached".to_string()),
                    imported.content,
                ),
                WrapOutcome::NoMatch(why) if imported.changed => (
                    TransformResult::ImportsAdded,
                    Some(format!("query not wrapped: {}", why)),
                    imported.content,
                ),
                WrapOutcome::NoMatch(why) => {
                    (TransformResult::NeedsManualReview, Some(why), imported.content)
                }
            }
        };

        let content = (text != content).then_some(text);
        FileOutcome {
            route: route.clone(),
            result,
            reason,
            policy: Some(policy),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> Transformer {
        Transformer::from_config(&Config::default()).unwrap()
    }

    const USERS_ROUTE: &str = "import { NextRequest, NextResponse } from 'next/server'
import { createClient } from '@/lib/supabase/server'

export async function GET(request: NextRequest) {
  const supabase = await createClient()
  const { data: users, error } = await supabase.from('users').select('*').order('name')
  if (error) {
    return NextResponse.json({ error: error.message }, { status: 500 })
  }
  return NextResponse.json(users)
}
";

    #[test]
    fn wraps_eligible_route() {
        let route = RoutePath::new("app/api/users/route.ts");
        let outcome = transformer().transform(&route, USERS_ROUTE);

        assert_eq!(outcome.result, TransformResult::Wrapped);
        let content = outcome.content.unwrap();
        assert!(content.contains("import { unstable_cache } from 'next/cache'"));
        assert!(content.contains("import { CACHE_TAGS } from '@/lib/cache'"));
        assert!(content.contains("tags: [CACHE_TAGS.users]"));
        assert!(content.contains("  if (error) {\n"));
    }

    #[test]
    fn second_run_is_already_cached() {
        let route = RoutePath::new("app/api/users/route.ts");
        let first = transformer().transform(&route, USERS_ROUTE);
        let once = first.content.unwrap();

        let second = transformer().transform(&route, &once);
        assert_eq!(second.result, TransformResult::AlreadyCached);
        assert!(second.content.is_none());
    }

    #[test]
    fn excluded_route_untouched() {
        let route = RoutePath::new("app/api/auth/users/route.ts");
        let outcome = transformer().transform(&route, USERS_ROUTE);
        assert_eq!(outcome.result, TransformResult::Excluded);
        assert!(outcome.content.is_none());
        assert!(outcome.policy.is_none());
    }

    #[test]
    fn ambiguous_query_keeps_imports() {
        let content = USERS_ROUTE.replace(
            "  const { data: users",
            "  const { data: me } = await supabase.from('profiles').select('id').single()\n  const { data: users",
        );
        let route = RoutePath::new("app/api/users/route.ts");
        let outcome = transformer().transform(&route, &content);

        assert_eq!(outcome.result, TransformResult::ImportsAdded);
        assert!(outcome.reason.unwrap().contains("2 candidate queries"));
        let written = outcome.content.unwrap();
        assert!(!written.contains("unstable_cache("));

        // re-running only flags the file, content stays put
        let again = transformer().transform(&route, &written);
        assert_eq!(again.result, TransformResult::NeedsManualReview);
        assert!(again.content.is_none());
    }

    #[test]
    fn missing_anchor_blocks_wrapping() {
        let content = USERS_ROUTE.replace("from 'next/server'", "from 'next/dist/server'");
        let route = RoutePath::new("app/api/users/route.ts");
        let outcome = transformer().transform(&route, &content);

        assert_eq!(outcome.result, TransformResult::NeedsManualReview);
        assert!(outcome.reason.unwrap().contains("required imports missing"));
        assert!(outcome.content.is_none());
    }

    #[test]
    fn imports_only_mode() {
        let route = RoutePath::new("app/api/users/route.ts");
        let t = transformer().with_wrapping(false);

        let outcome = t.transform(&route, USERS_ROUTE);
        assert_eq!(outcome.result, TransformResult::ImportsAdded);
        let once = outcome.content.unwrap();
        assert!(!once.contains("unstable_cache("));

        let again = t.transform(&route, &once);
        assert_eq!(again.result, TransformResult::NeedsManualReview);
        assert!(again.content.is_none());
    }

    #[test]
    fn result_categories() {
        assert!(TransformResult::Wrapped.is_success());
        assert!(TransformResult::ImportsAdded.is_success());
        assert!(TransformResult::Excluded.is_skip());
        assert!(!TransformResult::NeedsManualReview.is_skip());
        assert!(!TransformResult::NeedsManualReview.is_success());
    }
}
