use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};
use crate::scheduler::SchedulingState;

/// Maximum length of a card side in characters.
pub const MAX_SIDE_CHARS: usize = 2000;

//
// ─── CARD VALIDATION ERRORS ────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    #[error("card front cannot be empty")]
    EmptyFront,

    #[error("card back cannot be empty")]
    EmptyBack,

    #[error("card front exceeds {MAX_SIDE_CHARS} characters (got {0})")]
    FrontTooLong(usize),

    #[error("card back exceeds {MAX_SIDE_CHARS} characters (got {0})")]
    BackTooLong(usize),
}

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// Unvalidated card content, as entered by a user or an importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
}

impl CardDraft {
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    /// Validate the draft against the content rules.
    ///
    /// Both sides must be non-blank and at most `MAX_SIDE_CHARS` characters.
    /// Validation happens before any storage call; scheduling never sees
    /// invalid content.
    ///
    /// # Errors
    ///
    /// Returns `CardValidationError` describing the first violated rule.
    pub fn validate(self) -> Result<CardContent, CardValidationError> {
        CardContent::from_persisted(self.front, self.back)
    }
}

/// Validated front/back text for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    front: String,
    back: String,
}

impl CardContent {
    /// Rebuild content from stored values, re-running the content rules.
    ///
    /// # Errors
    ///
    /// Returns `CardValidationError` if a side is blank or too long.
    pub fn from_persisted(
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, CardValidationError> {
        let front = front.into();
        let back = back.into();

        if front.trim().is_empty() {
            return Err(CardValidationError::EmptyFront);
        }
        if back.trim().is_empty() {
            return Err(CardValidationError::EmptyBack);
        }

        let front_chars = front.chars().count();
        if front_chars > MAX_SIDE_CHARS {
            return Err(CardValidationError::FrontTooLong(front_chars));
        }
        let back_chars = back.chars().count();
        if back_chars > MAX_SIDE_CHARS {
            return Err(CardValidationError::BackTooLong(back_chars));
        }

        Ok(Self { front, back })
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }
}

/// The unit of study. Owned by exactly one deck.
///
/// A `Card` always represents a live (non-deleted) card: soft deletion is a
/// storage-layer flag, and deleted rows never surface as domain cards.
/// Scheduling state is mutated only through the ease update machinery in
/// [`crate::scheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    content: CardContent,
    scheduling: SchedulingState,
    created_at: DateTime<Utc>,
}

impl Card {
    /// Create a brand-new card with default scheduling state.
    #[must_use]
    pub fn new(
        id: CardId,
        deck_id: DeckId,
        content: CardContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            deck_id,
            content,
            scheduling: SchedulingState::new_card(),
            created_at,
        }
    }

    /// Reassemble a card from persisted parts.
    #[must_use]
    pub fn from_persisted(
        id: CardId,
        deck_id: DeckId,
        content: CardContent,
        scheduling: SchedulingState,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            deck_id,
            content,
            scheduling,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        self.content.front()
    }

    #[must_use]
    pub fn back(&self) -> &str {
        self.content.back()
    }

    #[must_use]
    pub fn content(&self) -> &CardContent {
        &self.content
    }

    #[must_use]
    pub fn scheduling(&self) -> &SchedulingState {
        &self.scheduling
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Replace the scheduling state with the result of an ease update.
    pub fn set_scheduling(&mut self, scheduling: SchedulingState) {
        self.scheduling = scheduling;
    }

    /// Replace the content with a newly validated edit.
    pub fn set_content(&mut self, content: CardContent) {
        self.content = content;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
