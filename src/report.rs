//! Run summary
//!
//! Aggregates one `TransformResult` per file into category counts and
//! renders them as plain lines or JSON. The manual-review list is capped in
//! the text form and always printed, even when empty.

use crate::route::RoutePath;
use crate::transform::TransformResult;
use chrono::{DateTime, Utc};

/// Maximum manual-review entries listed in the text summary
pub const MANUAL_LIST_CAP: usize = 10;

/// Counts per category for one run
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total: usize,
    pub wrapped: usize,
    pub imports_added: usize,
    pub already_cached: usize,
    pub excluded: usize,
    pub no_get_handler: usize,
    pub needs_manual: usize,
    /// Files that could not be read or written
    pub errors: usize,
    pub manual_review: Vec<RoutePath>,
    pub failed: Vec<RoutePath>,
    pub dry_run: bool,
}

impl Summary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Record a file's terminal state
    pub fn record(&mut self, route: &RoutePath, result: TransformResult) {
        self.total += 1;
        match result {
            TransformResult::Wrapped => self.wrapped += 1,
            TransformResult::ImportsAdded => self.imports_added += 1,
            TransformResult::AlreadyCached => self.already_cached += 1,
            TransformResult::Excluded => self.excluded += 1,
            TransformResult::NoGetHandler => self.no_get_handler += 1,
            TransformResult::NeedsManualReview => {
                self.needs_manual += 1;
                self.manual_review.push(route.clone());
            }
        }
    }

    /// Record a file that failed with an I/O error
    pub fn record_error(&mut self, route: &RoutePath) {
        self.total += 1;
        self.errors += 1;
        self.failed.push(route.clone());
    }

    pub fn succeeded(&self) -> usize {
        self.wrapped + self.imports_added
    }

    pub fn skipped(&self) -> usize {
        self.already_cached + self.excluded + self.no_get_handler
    }

    /// Plain-text summary, one entry per line
    pub fn render_lines(&self) -> Vec<String> {
        let rule = "=".repeat(70);
        let mut lines = vec![
            rule.clone(),
            if self.dry_run {
                "SUMMARY (dry run, no files written)".to_string()
            } else {
                "SUMMARY".to_string()
            },
            rule,
            format!("Total routes: {}", self.total),
            format!(
                "Succeeded: {} (wrapped: {}, imports added: {})",
                self.succeeded(),
                self.wrapped,
                self.imports_added
            ),
            format!(
                "Skipped: {} (already cached: {}, excluded: {}, no GET handler: {})",
                self.skipped(),
                self.already_cached,
                self.excluded,
                self.no_get_handler
            ),
            format!("Needs manual review: {}", self.needs_manual),
        ];
        if self.errors > 0 {
            lines.push(format!("Errors: {}", self.errors));
        }

        lines.push(String::new());
        lines.push("Routes needing manual caching:".to_string());
        lines.extend(manual_list_lines(&self.manual_review));
        lines
    }

    /// JSON summary with the full manual-review list
    pub fn to_json(&self, generated_at: DateTime<Utc>) -> serde_json::Value {
        serde_json::json!({
            "generated_at": generated_at.to_rfc3339(),
            "dry_run": self.dry_run,
            "total": self.total,
            "succeeded": self.succeeded(),
            "skipped": self.skipped(),
            "needs_manual": self.needs_manual,
            "errors": self.errors,
            "counts": {
                "wrapped": self.wrapped,
                "imports_added": self.imports_added,
                "already_cached": self.already_cached,
                "excluded": self.excluded,
                "no_get_handler": self.no_get_handler,
                "needs_manual_review": self.needs_manual,
            },
            "manual_review": self.manual_review,
            "failed": self.failed,
        })
    }
}

/// Capped listing: first ten entries, then `... and N more`
pub fn manual_list_lines(routes: &[RoutePath]) -> Vec<String> {
    if routes.is_empty() {
        return vec!["  (none)".to_string()];
    }

    let mut lines: Vec<String> = routes
        .iter()
        .take(MANUAL_LIST_CAP)
        .map(|route| format!("  • {}", route))
        .collect();
    if routes.len() > MANUAL_LIST_CAP {
        lines.push(format!("  ... and {} more", routes.len() - MANUAL_LIST_CAP));
    }
    lines
}
