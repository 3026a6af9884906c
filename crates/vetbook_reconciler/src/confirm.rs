//! Explicit user confirmation for irreversible actions.

/// Asks the user to confirm an irreversible action.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything, for `--yes` style flags and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
