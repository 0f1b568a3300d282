use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when decoding a review outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review outcome value: {0}")]
    InvalidOutcome(u8),
}

//
// ─── REVIEW OUTCOME ───────────────────────────────────────────────────────────
//

/// Three-level grading result for a single answer attempt.
///
/// An outcome is ephemeral: it is produced once per answered card and consumed
/// immediately by the ease update machinery. It is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The answer was correct. Ease goes up.
    Correct,
    /// The answer was close but not fully right. Ease drops slightly.
    Partial,
    /// The answer was wrong. Ease drops sharply.
    Incorrect,
}

impl ReviewOutcome {
    /// Converts a numeric outcome (0-2) to a `ReviewOutcome`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidOutcome` if the value is not in the range 0-2.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            0 => Ok(Self::Correct),
            1 => Ok(Self::Partial),
            2 => Ok(Self::Incorrect),
            _ => Err(ReviewError::InvalidOutcome(value)),
        }
    }

    /// Numeric encoding used at the transport boundary (0-2).
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            ReviewOutcome::Correct => 0,
            ReviewOutcome::Partial => 1,
            ReviewOutcome::Incorrect => 2,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
