use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ReviewOutcome;

/// Lowest ease a card can reach.
pub const MIN_EASE: f64 = 1.3;
/// Highest ease a card can reach.
pub const MAX_EASE: f64 = 5.0;
/// Ease assigned to a freshly created card.
pub const DEFAULT_EASE: f64 = 2.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

//
// ─── EASE POLICY ───────────────────────────────────────────────────────────────
//

/// Rule-set for how a review outcome moves a card's ease.
///
/// The system historically shipped with two divergent formulas. Both are kept
/// as named policies; a deployment picks one explicitly rather than reading it
/// from ambient settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasePolicy {
    /// Percentage-based: Correct ×1.05, Partial ×0.95, Incorrect ×0.85.
    #[default]
    Multiplicative,
    /// Fixed-increment: Correct +0.15, Incorrect −0.20. No partial adjustment
    /// is defined under this policy; ease is left unchanged on Partial.
    Additive,
}

impl EasePolicy {
    /// Compute the post-review ease, clamped to `[MIN_EASE, MAX_EASE]`.
    ///
    /// Pure arithmetic with clamps: an out-of-range input ease is pulled back
    /// into the domain rather than rejected.
    #[must_use]
    pub fn next_ease(self, ease: f64, outcome: ReviewOutcome) -> f64 {
        let raw = match (self, outcome) {
            (EasePolicy::Multiplicative, ReviewOutcome::Correct) => ease * 1.05,
            (EasePolicy::Multiplicative, ReviewOutcome::Partial) => ease * 0.95,
            (EasePolicy::Multiplicative, ReviewOutcome::Incorrect) => ease * 0.85,
            (EasePolicy::Additive, ReviewOutcome::Correct) => ease + 0.15,
            (EasePolicy::Additive, ReviewOutcome::Partial) => ease,
            (EasePolicy::Additive, ReviewOutcome::Incorrect) => ease - 0.20,
        };
        raw.clamp(MIN_EASE, MAX_EASE)
    }
}

//
// ─── REVIEW STATS ──────────────────────────────────────────────────────────────
//

/// Per-outcome review counters for a card.
///
/// The total is derived from the three outcome counters, so
/// `review_count() == correct + partial + incorrect` holds by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    correct: u32,
    partial: u32,
    incorrect: u32,
}

impl ReviewStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild stats from stored per-outcome counters.
    #[must_use]
    pub fn from_counts(correct: u32, partial: u32, incorrect: u32) -> Self {
        Self {
            correct,
            partial,
            incorrect,
        }
    }

    /// Total number of reviews, always the sum of the outcome counters.
    #[must_use]
    pub fn review_count(&self) -> u32 {
        self.correct + self.partial + self.incorrect
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn partial_count(&self) -> u32 {
        self.partial
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect
    }

    /// Returns a copy with the counter matching `outcome` incremented.
    #[must_use]
    pub fn record(mut self, outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Correct => self.correct += 1,
            ReviewOutcome::Partial => self.partial += 1,
            ReviewOutcome::Incorrect => self.incorrect += 1,
        }
        self
    }
}

//
// ─── SCHEDULING STATE ──────────────────────────────────────────────────────────
//

/// The scheduling half of a card: ease, counters, and recency.
///
/// Store this with each card; it is mutated only by [`Scheduler::apply_review`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    ease: f64,
    stats: ReviewStats,
    last_reviewed: Option<DateTime<Utc>>,
}

impl SchedulingState {
    /// State for a card that has never been reviewed.
    #[must_use]
    pub fn new_card() -> Self {
        Self {
            ease: DEFAULT_EASE,
            stats: ReviewStats::new(),
            last_reviewed: None,
        }
    }

    /// Rebuild state from persisted values.
    ///
    /// A stored ease outside `[MIN_EASE, MAX_EASE]` (or non-finite) is clamped
    /// back into the domain; invalid numeric state is never a load failure.
    #[must_use]
    pub fn from_persisted(
        ease: f64,
        stats: ReviewStats,
        last_reviewed: Option<DateTime<Utc>>,
    ) -> Self {
        let ease = if ease.is_finite() {
            ease.clamp(MIN_EASE, MAX_EASE)
        } else {
            DEFAULT_EASE
        };
        Self {
            ease,
            stats,
            last_reviewed,
        }
    }

    #[must_use]
    pub fn ease(&self) -> f64 {
        self.ease
    }

    #[must_use]
    pub fn stats(&self) -> &ReviewStats {
        &self.stats
    }

    #[must_use]
    pub fn last_reviewed(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed
    }
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self::new_card()
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Ease-based scheduler: grades answers and scores cards for review priority.
///
/// All computation here is synchronous and pure. Given valid current state the
/// transition cannot fail; missing-card errors belong to the persistence layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    policy: EasePolicy,
}

impl Scheduler {
    #[must_use]
    pub fn new(policy: EasePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> EasePolicy {
        self.policy
    }

    /// Apply one review outcome to a card's scheduling state.
    ///
    /// Returns the new state: ease moved per the policy (clamped), the total
    /// and matching outcome counter incremented, and `last_reviewed` set to
    /// `reviewed_at`. The input state is untouched; persistence is the
    /// caller's responsibility.
    #[must_use]
    pub fn apply_review(
        &self,
        state: &SchedulingState,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> SchedulingState {
        SchedulingState {
            ease: self.policy.next_ease(state.ease, outcome),
            stats: state.stats.record(outcome),
            last_reviewed: Some(reviewed_at),
        }
    }
}

//
// ─── PRIORITY SCORE ────────────────────────────────────────────────────────────
//

/// Fractional days elapsed between two instants.
#[must_use]
pub fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let seconds = to.signed_duration_since(from).num_seconds();

    // NOTE: `num_seconds()` returns `i64`. Converting to `f64` may lose
    // precision for extremely large durations, but review gaps in this app
    // are bounded to human timescales.
    #[allow(clippy::cast_precision_loss)]
    let seconds_f = seconds as f64;

    seconds_f / SECONDS_PER_DAY
}

/// Priority score for a card: higher means more urgently due.
///
/// The rule is "ease × time": the score grows with both ease and the gap
/// since the last review, divided by `review_count + 1` so heavily-reviewed
/// cards yield to fresher ones. A card that has never been reviewed scores
/// `f64::INFINITY` and sorts to the front of any queue. A backdated
/// `last_reviewed` clamps to zero elapsed time instead of going negative.
///
/// The result is deterministic; randomized jitter is applied by the queue
/// builder, not here.
#[must_use]
pub fn priority_score(state: &SchedulingState, now: DateTime<Utc>) -> f64 {
    let Some(last) = state.last_reviewed() else {
        return f64::INFINITY;
    };

    let elapsed = elapsed_days(last, now).max(0.0);
    state.ease() * elapsed / f64::from(state.stats().review_count() + 1)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
