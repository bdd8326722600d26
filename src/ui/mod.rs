//! UI module for consistent CLI output
//!
//! Uses `cliclack` log lines and prompts in interactive terminals, with
//! automatic fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use routecache::ui::{self, UiContext, FileProgress};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! ui::intro(&ctx, "routecache apply");
//!
//! let progress = FileProgress::new(&ctx, routes.len() as u64);
//! for route in &routes {
//!     progress.advance(route.as_str());
//! }
//! progress.finish();
//!
//! ui::step_ok_detail(&ctx, "app/api/users/route.ts", "wrapped");
//!
//! let write = ui::confirm(&ctx, "Write 3 modified files?", true).await?;
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, section, step_error_detail, step_info,
    step_ok_detail, step_warn_hint,
};
pub use progress::FileProgress;
pub use prompts::confirm;
