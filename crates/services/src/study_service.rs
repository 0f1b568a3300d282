use std::sync::Arc;

use recall_core::{
    model::{Card, DeckId, ReviewOutcome},
    scheduler::EasePolicy,
    time::Clock,
};
use storage::repository::CardRepository;

use crate::error::StudyError;
use crate::queue::{QueueBuilder, StudyQueue};
use crate::review_service::ReviewService;

/// Drives a study session: loads a card pool, keeps it ordered, and applies
/// answers through the review service with persistence.
#[derive(Clone)]
pub struct StudyService {
    cards: Arc<dyn CardRepository>,
    review: ReviewService,
    builder: QueueBuilder,
}

impl StudyService {
    #[must_use]
    pub fn new(cards: Arc<dyn CardRepository>, policy: EasePolicy) -> Self {
        Self {
            cards,
            review: ReviewService::new(policy),
            builder: QueueBuilder::new(),
        }
    }

    /// Override the clock used for review timestamps and queue ordering.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.review = self.review.with_clock(clock);
        self
    }

    /// Enable or disable score jitter in the queue order.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.builder = self.builder.with_jitter(jitter);
        self
    }

    /// Load the live cards of the given decks and build a study queue.
    ///
    /// Decks are loaded in the order given; the queue then orders the combined
    /// pool purely by score.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` if any deck cannot be read.
    pub async fn start(&self, deck_ids: &[DeckId]) -> Result<StudyQueue, StudyError> {
        let mut pool = Vec::new();
        for deck_id in deck_ids {
            pool.extend(self.cards.cards_for_deck(*deck_id).await?);
        }
        Ok(StudyQueue::new(pool, self.review.now(), self.builder))
    }

    /// Answer the card at the head of the queue.
    ///
    /// Applies the outcome, persists the new scheduling state, records the
    /// answer in the queue history, and re-sorts the whole pool. The answered
    /// card stays in the pool with its collapsed score.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::EmptyQueue` if there is no current card, or a
    /// storage error if persistence fails (the queue order is left untouched
    /// in that case).
    pub async fn answer_current(
        &self,
        queue: &mut StudyQueue,
        outcome: ReviewOutcome,
    ) -> Result<Card, StudyError> {
        let card_id = queue.current().ok_or(StudyError::EmptyQueue)?.id();

        let updated = self
            .review
            .review_card_persisted_by_id(card_id, self.cards.as_ref(), outcome)
            .await
            .map_err(StudyError::Review)?;

        queue.record_answer(updated.clone(), self.review.now());
        Ok(updated)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use recall_core::model::{CardDraft, CardId, Category, CategoryId, Deck};
    use recall_core::time::{fixed_clock, fixed_now};
    use storage::repository::{DeckRepository, InMemoryRepository};

    async fn seed(repo: &InMemoryRepository, deck: u64, fronts: &[&str]) -> DeckId {
        let category = Category::new(CategoryId::new(1), "Cat", 0, fixed_now()).unwrap();
        repo.upsert_category(&category).await.unwrap();
        let deck = Deck::new(DeckId::new(deck), category.id(), "Deck", 0, fixed_now()).unwrap();
        repo.upsert_deck(&deck).await.unwrap();

        let contents: Vec<_> = fronts
            .iter()
            .map(|f| CardDraft::new(*f, "back").validate().unwrap())
            .collect();
        repo.insert_cards(deck.id(), &contents, fixed_now())
            .await
            .unwrap();
        deck.id()
    }

    fn service(repo: &InMemoryRepository) -> StudyService {
        StudyService::new(Arc::new(repo.clone()), EasePolicy::Multiplicative)
            .with_clock(fixed_clock())
            .with_jitter(false)
    }

    #[tokio::test]
    async fn start_combines_pools_from_several_decks() {
        let repo = InMemoryRepository::new();
        let a = seed(&repo, 1, &["a1", "a2"]).await;
        let deck =
            Deck::new(DeckId::new(2), CategoryId::new(1), "Other", 1, fixed_now()).unwrap();
        repo.upsert_deck(&deck).await.unwrap();
        let content = CardDraft::new("b1", "back").validate().unwrap();
        repo.insert_cards(deck.id(), &[content], fixed_now())
            .await
            .unwrap();

        let queue = service(&repo).start(&[a, deck.id()]).await.unwrap();
        assert_eq!(queue.len(), 3);
    }

    #[tokio::test]
    async fn answering_persists_and_reorders() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, 1, &["q1", "q2"]).await;
        let service = service(&repo);

        let mut queue = service.start(&[deck_id]).await.unwrap();
        let first = queue.current().unwrap().id();

        let updated = service
            .answer_current(&mut queue, ReviewOutcome::Correct)
            .await
            .unwrap();

        assert_eq!(updated.id(), first);
        assert!((updated.scheduling().ease() - 2.625).abs() < 1e-9);

        // The answered card's score drops to zero; the untouched new card
        // (infinite score) takes the head.
        assert_ne!(queue.current().unwrap().id(), first);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.history().latest(), Some(first));

        let stored = repo.get_card(first).await.unwrap();
        assert_eq!(stored.scheduling().stats().review_count(), 1);
    }

    #[tokio::test]
    async fn answered_cards_stay_in_the_pool() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, 1, &["only"]).await;
        let service = service(&repo);

        let mut queue = service.start(&[deck_id]).await.unwrap();
        service
            .answer_current(&mut queue, ReviewOutcome::Partial)
            .await
            .unwrap();

        assert_eq!(queue.len(), 1);
        assert!(queue.current().is_some());
    }

    #[tokio::test]
    async fn empty_queue_rejects_answers() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, 1, &[]).await;
        let service = service(&repo);

        let mut queue = service.start(&[deck_id]).await.unwrap();
        let err = service
            .answer_current(&mut queue, ReviewOutcome::Correct)
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::EmptyQueue));
    }

    #[tokio::test]
    async fn stale_cards_are_studied_before_fresh_reviews() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, 1, &["old", "new"]).await;

        // Review both, one a month ago and one an hour ago.
        let month_ago = ReviewService::new(EasePolicy::Multiplicative)
            .with_clock(Clock::fixed(fixed_now() - Duration::days(30)));
        month_ago
            .review_card_persisted_by_id(CardId::new(1), &repo, ReviewOutcome::Correct)
            .await
            .unwrap();
        let hour_ago = ReviewService::new(EasePolicy::Multiplicative)
            .with_clock(Clock::fixed(fixed_now() - Duration::hours(1)));
        hour_ago
            .review_card_persisted_by_id(CardId::new(2), &repo, ReviewOutcome::Correct)
            .await
            .unwrap();

        let queue = service(&repo).start(&[deck_id]).await.unwrap();
        assert_eq!(queue.current().unwrap().id(), CardId::new(1));
    }
}
