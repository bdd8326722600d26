//! Progress indicator for per-file processing

use super::context::UiContext;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the discovered route files.
///
/// Shows an indicatif bar in interactive mode and nothing otherwise; the
/// per-file step lines carry the information in CI logs.
pub struct FileProgress {
    bar: Option<ProgressBar>,
}

impl FileProgress {
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        let bar = if ctx.use_fancy_output() && total > 0 {
            let bar = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Processing  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// Mark one more file as started
    pub fn advance(&self, label: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(shorten(label, 48));
            bar.inc(1);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Keep the tail of long route paths, which is the informative part
fn shorten(label: &str, max: usize) -> String {
    let count = label.chars().count();
    if count <= max {
        return label.to_string();
    }
    let tail: String = label.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}
