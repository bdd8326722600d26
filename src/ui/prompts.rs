//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{RouteCacheError, RouteCacheResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> RouteCacheResult<bool> {
    if ctx.auto_yes() {
        if !ctx.is_plain() {
            println!("  {} (auto-approved)", message);
        }
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| RouteCacheError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| RouteCacheError::User(format!("Prompt failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        let result = confirm(&ctx, "Write 3 files?", false).await.unwrap();
        assert!(result);
    }

    #[tokio::test]
    async fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Write?", true).await.unwrap());
        assert!(!confirm(&ctx, "Write?", false).await.unwrap());
    }
}
