use serde::{Deserialize, Serialize};

/// Result of a pre-check-then-act mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The upstream mutation was issued and succeeded.
    Applied,
    /// The desired state already held; nothing was sent upstream.
    AlreadySatisfied,
}

impl MutationOutcome {
    /// Returns true when an upstream mutation was issued.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
