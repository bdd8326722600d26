//! UI context for detecting interactive vs CI environments

use std::io::IsTerminal;

/// CI indicators checked besides `CI` itself
const CI_VARS: &[&str] = &[
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether running in an interactive terminal
    interactive: bool,
    /// Whether --yes was passed (write without asking)
    auto_yes: bool,
    /// Machine-readable output requested; no spinners, bars or prompts
    plain: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            auto_yes: false,
            plain: false,
        }
    }

    /// Create a non-interactive context (for testing or explicit CI mode)
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
            plain: false,
        }
    }

    /// Set auto-yes mode (bypass prompts)
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    /// Force plain output, e.g. for `--format json`
    pub fn with_plain(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    /// Check if prompts can be shown
    pub fn is_interactive(&self) -> bool {
        self.interactive && !self.plain
    }

    /// Check if prompts should be auto-approved
    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Check if we should use fancy output (cliclack lines, progress bars)
    pub fn use_fancy_output(&self) -> bool {
        self.interactive && !self.plain
    }

    /// Whether human-oriented step lines should be printed at all
    pub fn is_plain(&self) -> bool {
        self.plain
    }

    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() || !std::io::stdin().is_terminal() {
            return false;
        }

        if std::env::var_os("CI").is_some() {
            return false;
        }

        !CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.auto_yes());
        assert!(!ctx.is_plain());
    }

    #[test]
    fn plain_disables_fancy_output() {
        let ctx = UiContext {
            interactive: true,
            auto_yes: false,
            plain: false,
        }
        .with_plain(true);
        assert!(!ctx.use_fancy_output());
        assert!(!ctx.is_interactive());
        assert!(ctx.is_plain());
    }
}
