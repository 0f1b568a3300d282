use chrono::{DateTime, Utc};
use rand::Rng;

use recall_core::history::RecentCards;
use recall_core::model::{Card, CardId};
use recall_core::scheduler::priority_score;

/// Upper bound of the multiplicative score jitter (a few percent).
pub const JITTER_MAX: f64 = 0.05;

/// How many recently presented cards the queue remembers for "previous card".
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

//
// ─── QUEUE BUILDER ─────────────────────────────────────────────────────────────
//

/// Orders a pool of cards for study by descending priority score.
///
/// Jitter perturbs each card's score by up to [`JITTER_MAX`] per pass so that
/// re-scoring the same pool does not always put the same card at the head —
/// without it the card just answered could come straight back. Disable it for
/// deterministic inspection.
#[derive(Debug, Clone, Copy)]
pub struct QueueBuilder {
    jitter: bool,
}

impl QueueBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { jitter: true }
    }

    /// Enable or disable randomized score jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Score and sort the pool, highest priority first.
    ///
    /// Never-reviewed cards score infinite and land at the front. Ties are
    /// broken stably: equal scores keep their input order.
    #[must_use]
    pub fn build(&self, cards: Vec<Card>, now: DateTime<Utc>) -> Vec<Card> {
        let mut rng = rand::rng();

        let mut scored: Vec<(f64, Card)> = cards
            .into_iter()
            .map(|card| {
                let mut score = priority_score(card.scheduling(), now);
                if self.jitter {
                    score *= 1.0 + rng.random_range(0.0..JITTER_MAX);
                }
                (score, card)
            })
            .collect();

        // Stable sort; total_cmp keeps infinities ordered and cannot panic.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored.into_iter().map(|(_, card)| card).collect()
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── STUDY QUEUE ───────────────────────────────────────────────────────────────
//

/// An ordered pool of cards under study, plus a replay-only history ring.
///
/// Answered cards stay in the pool: their score collapses toward zero because
/// `last_reviewed` just moved, and the whole pool is re-scored and re-sorted
/// from scratch after every answer. The history ring only remembers what was
/// presented; it has no influence on ordering.
#[derive(Debug, Clone)]
pub struct StudyQueue {
    builder: QueueBuilder,
    pool: Vec<Card>,
    history: RecentCards,
}

impl StudyQueue {
    /// Build a queue over the given pool, ordered as of `now`.
    #[must_use]
    pub fn new(cards: Vec<Card>, now: DateTime<Utc>, builder: QueueBuilder) -> Self {
        Self::with_history_capacity(cards, now, builder, DEFAULT_HISTORY_CAPACITY)
    }

    /// Like [`StudyQueue::new`] with an explicit history ring capacity.
    #[must_use]
    pub fn with_history_capacity(
        cards: Vec<Card>,
        now: DateTime<Utc>,
        builder: QueueBuilder,
        history_capacity: usize,
    ) -> Self {
        Self {
            builder,
            pool: builder.build(cards, now),
            history: RecentCards::new(history_capacity),
        }
    }

    /// The card currently at the head of the queue.
    #[must_use]
    pub fn current(&self) -> Option<&Card> {
        self.pool.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// The pool in its current study order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.pool
    }

    /// Recently presented cards, newest first. Replay only.
    #[must_use]
    pub fn history(&self) -> &RecentCards {
        &self.history
    }

    /// Record the answered card and rebuild the entire queue order.
    ///
    /// `updated` is the post-review card; it replaces its pooled counterpart
    /// before the full re-score. Cards not already in the pool are ignored.
    pub fn record_answer(&mut self, updated: Card, now: DateTime<Utc>) {
        if let Some(slot) = self.pool.iter_mut().find(|c| c.id() == updated.id()) {
            self.history.push(updated.id());
            *slot = updated;
        }

        let pool = std::mem::take(&mut self.pool);
        self.pool = self.builder.build(pool, now);
    }

    /// The card shown before the most recent one, if the history holds it.
    #[must_use]
    pub fn previous_card(&self) -> Option<CardId> {
        self.history.nth_recent(1)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use recall_core::model::{CardDraft, DeckId};
    use recall_core::scheduler::{ReviewStats, SchedulingState};
    use recall_core::time::fixed_now;
    use std::collections::HashSet;

    fn build_card(id: u64) -> Card {
        let content = CardDraft::new(format!("Q{id}"), format!("A{id}"))
            .validate()
            .unwrap();
        Card::new(CardId::new(id), DeckId::new(1), content, fixed_now())
    }

    fn reviewed_card(id: u64, ease: f64, reviews: u32, days_ago: i64) -> Card {
        let mut card = build_card(id);
        card.set_scheduling(SchedulingState::from_persisted(
            ease,
            ReviewStats::from_counts(reviews, 0, 0),
            Some(fixed_now() - Duration::days(days_ago)),
        ));
        card
    }

    #[test]
    fn never_reviewed_cards_sort_to_the_front() {
        let fresh = build_card(1);
        let overdue = reviewed_card(2, 5.0, 1, 365);

        let queue = QueueBuilder::new().build(vec![overdue, fresh], fixed_now());
        assert_eq!(queue[0].id(), CardId::new(1));
    }

    #[test]
    fn higher_ease_and_longer_gap_score_ahead() {
        let recent = reviewed_card(1, 2.5, 1, 1);
        let stale = reviewed_card(2, 2.5, 1, 30);
        let easy_stale = reviewed_card(3, 4.5, 1, 30);

        let queue = QueueBuilder::new()
            .with_jitter(false)
            .build(vec![recent, stale, easy_stale], fixed_now());

        assert_eq!(queue[0].id(), CardId::new(3));
        assert_eq!(queue[1].id(), CardId::new(2));
        assert_eq!(queue[2].id(), CardId::new(1));
    }

    #[test]
    fn without_jitter_two_passes_are_identical() {
        let cards: Vec<_> = (1..=8).map(|i| reviewed_card(i, 2.5, 1, i as i64)).collect();
        let builder = QueueBuilder::new().with_jitter(false);

        let first: Vec<_> = builder
            .build(cards.clone(), fixed_now())
            .iter()
            .map(Card::id)
            .collect();
        let second: Vec<_> = builder
            .build(cards, fixed_now())
            .iter()
            .map(Card::id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn with_jitter_the_head_varies_across_trials() {
        // Three cards with identical state: only jitter separates them.
        let cards: Vec<_> = (1..=3).map(|i| reviewed_card(i, 2.5, 1, 10)).collect();
        let builder = QueueBuilder::new();

        let mut heads = HashSet::new();
        for _ in 0..50 {
            let queue = builder.build(cards.clone(), fixed_now());
            heads.insert(queue[0].id());
        }

        // Each trial draws fresh jitter, so one head winning all 50 passes is
        // astronomically unlikely.
        assert!(heads.len() > 1);
    }

    #[test]
    fn equal_scores_keep_input_order_without_jitter() {
        let cards: Vec<_> = (1..=4).map(|i| reviewed_card(i, 2.5, 1, 10)).collect();
        let queue = QueueBuilder::new().with_jitter(false).build(cards, fixed_now());

        let ids: Vec<_> = queue.iter().map(Card::id).collect();
        assert_eq!(
            ids,
            vec![CardId::new(1), CardId::new(2), CardId::new(3), CardId::new(4)]
        );
    }

    #[test]
    fn answered_card_falls_back_in_the_order() {
        let a = reviewed_card(1, 2.5, 1, 30);
        let b = reviewed_card(2, 2.5, 1, 10);
        let now = fixed_now();

        let mut queue =
            StudyQueue::new(vec![a, b], now, QueueBuilder::new().with_jitter(false));
        assert_eq!(queue.current().unwrap().id(), CardId::new(1));

        // Answering card 1 moves its last_reviewed to now; its score collapses.
        let mut answered = queue.current().unwrap().clone();
        answered.set_scheduling(SchedulingState::from_persisted(
            2.625,
            ReviewStats::from_counts(2, 0, 0),
            Some(now),
        ));
        queue.record_answer(answered, now);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current().unwrap().id(), CardId::new(2));
    }

    #[test]
    fn history_replays_presented_cards_with_wraparound() {
        let cards: Vec<_> = (1..=5).map(|i| reviewed_card(i, 2.5, 1, 10)).collect();
        let now = fixed_now();
        let mut queue = StudyQueue::with_history_capacity(
            cards,
            now,
            QueueBuilder::new().with_jitter(false),
            3,
        );

        for id in 1..=5 {
            let answered = queue
                .cards()
                .iter()
                .find(|c| c.id() == CardId::new(id))
                .unwrap()
                .clone();
            queue.record_answer(answered, now);
        }

        let recent: Vec<_> = queue.history().iter_recent().collect();
        assert_eq!(
            recent,
            vec![CardId::new(5), CardId::new(4), CardId::new(3)]
        );
        assert_eq!(queue.previous_card(), Some(CardId::new(4)));
    }

    #[test]
    fn answer_for_unknown_card_is_ignored() {
        let now = fixed_now();
        let mut queue = StudyQueue::new(
            vec![reviewed_card(1, 2.5, 1, 10)],
            now,
            QueueBuilder::new().with_jitter(false),
        );

        queue.record_answer(reviewed_card(99, 2.5, 1, 10), now);

        assert_eq!(queue.len(), 1);
        assert!(queue.history().is_empty());
    }
}
