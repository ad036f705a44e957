//! Completion of a generate-or-restore request

use crate::store_results::PendingResult;

/// How `generate_if_needed` obtained the active key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Existing material was loaded from the store
    Restored,
    /// A fresh pair was generated and persisted
    Generated,
}

impl GenerateOutcome {
    /// True if new key material was created
    #[must_use]
    pub fn is_generated(self) -> bool {
        matches!(self, GenerateOutcome::Generated)
    }
}

/// Single-shot completion of `generate_if_needed`
///
/// Resolves exactly once, to the outcome or to the error that stopped it.
pub type GenerateResult = PendingResult<GenerateOutcome>;
