/// Idle/Active pass state shared by the three renderers

use crate::error::Result;
use crate::gfx_bail;

/// Whether a renderer is between `begin` and `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    Active,
}

impl PassState {
    /// Idle -> Active
    pub(crate) fn enter(&mut self, source: &str) -> Result<()> {
        if *self == PassState::Active {
            gfx_bail!(source, InvalidState, "begin called while the pass is already active");
        }
        *self = PassState::Active;
        Ok(())
    }

    /// Active -> Idle
    pub(crate) fn leave(&mut self, source: &str) -> Result<()> {
        if *self == PassState::Idle {
            gfx_bail!(source, InvalidState, "end called without a matching begin");
        }
        *self = PassState::Idle;
        Ok(())
    }

    /// Reject `operation` unless the pass is active
    pub(crate) fn require_active(&self, source: &str, operation: &str) -> Result<()> {
        if *self != PassState::Active {
            gfx_bail!(source, InvalidState, "{} called outside begin/end", operation);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pass_state_tests.rs"]
mod tests;
