use chrono::{DateTime, Utc};

use recall_core::{
    model::{Card, CardId, ReviewOutcome},
    scheduler::{EasePolicy, Scheduler, SchedulingState},
    time::Clock,
};
use storage::repository::CardRepository;

use crate::error::ReviewServiceError;

/// Coordinates applying a user's answer to a card via the ease scheduler.
///
/// The ease policy is fixed at construction and passed down explicitly; the
/// service never reads scheduling configuration from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
}

impl ReviewService {
    /// Create a review service for the given ease policy with a real-time clock.
    #[must_use]
    pub fn new(policy: EasePolicy) -> Self {
        Self {
            clock: Clock::default(),
            scheduler: Scheduler::new(policy),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Apply an outcome to an in-memory card, returning the new state.
    ///
    /// Pure: the transition cannot fail once given a valid card, and
    /// persistence stays the caller's responsibility.
    pub fn review_card(
        &self,
        card: &mut Card,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> SchedulingState {
        let next = self
            .scheduler
            .apply_review(card.scheduling(), outcome, reviewed_at);
        card.set_scheduling(next);
        next
    }

    /// Load a card, apply an outcome, and persist the updated scheduling state.
    ///
    /// Uses the service clock for `reviewed_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if the card is missing or
    /// soft-deleted; other storage errors pass through unchanged.
    pub async fn review_card_persisted_by_id(
        &self,
        card_id: CardId,
        cards: &dyn CardRepository,
        outcome: ReviewOutcome,
    ) -> Result<Card, ReviewServiceError> {
        let mut card = cards.get_card(card_id).await?;
        let next = self.review_card(&mut card, outcome, self.now());
        let persisted = cards.persist_scheduling(card_id, &next).await?;
        Ok(persisted)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
