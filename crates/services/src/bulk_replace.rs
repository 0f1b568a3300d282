use std::sync::Arc;

use recall_core::{
    model::{Card, CardContent, CardDraft, DeckId},
    time::Clock,
};
use storage::repository::CardRepository;

use crate::error::BulkReplaceError;

/// Replaces the entire card set of a deck atomically-in-effect.
///
/// The repository trait exposes no transaction handle, so the replace runs as
/// a compensating sequence over soft deletion: flag the old cards, insert the
/// new ones, and on insert failure clear the flags again. Old cards are never
/// purged here; they stay soft-deleted and addressable until a separate
/// cleanup decides otherwise.
#[derive(Clone)]
pub struct BulkReplaceService {
    cards: Arc<dyn CardRepository>,
    clock: Clock,
}

impl BulkReplaceService {
    #[must_use]
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self {
            cards,
            clock: Clock::default(),
        }
    }

    /// Override the clock used for delete and insert timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Swap a deck's cards for a new set.
    ///
    /// All drafts are validated up front; nothing is touched in storage until
    /// every draft passes. Returns the inserted cards with fresh scheduling
    /// state.
    ///
    /// # Errors
    ///
    /// - `Validation` if any draft is invalid (storage untouched).
    /// - `Storage` if the initial soft delete fails (storage untouched).
    /// - `RolledBack` if the insert failed and the old cards were restored.
    /// - `RollbackFailed` if both the insert and the restore failed; the deck
    ///   is left without live cards and the soft-deleted rows need manual
    ///   reconciliation.
    pub async fn replace_deck_cards(
        &self,
        deck_id: DeckId,
        drafts: Vec<CardDraft>,
    ) -> Result<Vec<Card>, BulkReplaceError> {
        let mut contents: Vec<CardContent> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            contents.push(draft.validate()?);
        }

        let now = self.clock.now();
        let deleted = self.cards.soft_delete_cards(deck_id, now).await?;

        match self.cards.insert_cards(deck_id, &contents, now).await {
            Ok(inserted) => Ok(inserted),
            Err(insert_err) => match self.cards.restore_cards(&deleted).await {
                Ok(_) => Err(BulkReplaceError::RolledBack { source: insert_err }),
                Err(restore_err) => Err(BulkReplaceError::RollbackFailed {
                    insert: insert_err,
                    restore: restore_err,
                }),
            },
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use recall_core::model::{Card, CardId, Category, CategoryId, Deck};
    use recall_core::scheduler::SchedulingState;
    use recall_core::time::{fixed_clock, fixed_now};
    use storage::repository::{DeckRepository, InMemoryRepository, StorageError};

    async fn seed(repo: &InMemoryRepository, fronts: &[&str]) -> DeckId {
        let category = Category::new(CategoryId::new(1), "Cat", 0, fixed_now()).unwrap();
        repo.upsert_category(&category).await.unwrap();
        let deck = Deck::new(DeckId::new(1), category.id(), "Deck", 0, fixed_now()).unwrap();
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

    /// Wrapper that forwards to an inner repository but fails selected calls.
    struct FaultyRepository {
        inner: InMemoryRepository,
        fail_insert: bool,
        fail_restore: bool,
    }

    #[async_trait]
    impl CardRepository for FaultyRepository {
        async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
            self.inner.cards_for_deck(deck_id).await
        }

        async fn get_card(&self, id: CardId) -> Result<Card, StorageError> {
            self.inner.get_card(id).await
        }

        async fn persist_scheduling(
            &self,
            id: CardId,
            scheduling: &SchedulingState,
        ) -> Result<Card, StorageError> {
            self.inner.persist_scheduling(id, scheduling).await
        }

        async fn insert_cards(
            &self,
            deck_id: DeckId,
            contents: &[CardContent],
            created_at: DateTime<Utc>,
        ) -> Result<Vec<Card>, StorageError> {
            if self.fail_insert {
                return Err(StorageError::Connection("insert refused".into()));
            }
            self.inner.insert_cards(deck_id, contents, created_at).await
        }

        async fn soft_delete_cards(
            &self,
            deck_id: DeckId,
            deleted_at: DateTime<Utc>,
        ) -> Result<Vec<CardId>, StorageError> {
            self.inner.soft_delete_cards(deck_id, deleted_at).await
        }

        async fn restore_cards(&self, ids: &[CardId]) -> Result<Vec<CardId>, StorageError> {
            if self.fail_restore {
                return Err(StorageError::Connection("restore refused".into()));
            }
            self.inner.restore_cards(ids).await
        }
    }

    #[tokio::test]
    async fn replace_swaps_the_live_card_set() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, &["old-a", "old-b"]).await;

        let service =
            BulkReplaceService::new(Arc::new(repo.clone())).with_clock(fixed_clock());
        let inserted = service
            .replace_deck_cards(
                deck_id,
                vec![CardDraft::new("new-c", "back"), CardDraft::new("new-d", "back")],
            )
            .await
            .unwrap();

        assert_eq!(inserted.len(), 2);

        let live = repo.cards_for_deck(deck_id).await.unwrap();
        let fronts: Vec<_> = live.iter().map(|c| c.content().front()).collect();
        assert_eq!(fronts, vec!["new-c", "new-d"]);

        // Old cards are soft-deleted, not purged.
        assert!(repo.is_soft_deleted(CardId::new(1)).unwrap());
        assert!(repo.is_soft_deleted(CardId::new(2)).unwrap());
    }

    #[tokio::test]
    async fn replacing_an_empty_deck_just_inserts() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, &[]).await;

        let service =
            BulkReplaceService::new(Arc::new(repo.clone())).with_clock(fixed_clock());
        let inserted = service
            .replace_deck_cards(deck_id, vec![CardDraft::new("only", "back")])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(repo.cards_for_deck(deck_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_leaves_storage_untouched() {
        let repo = InMemoryRepository::new();
        let deck_id = seed(&repo, &["keep"]).await;

        let service =
            BulkReplaceService::new(Arc::new(repo.clone())).with_clock(fixed_clock());
        let err = service
            .replace_deck_cards(
                deck_id,
                vec![CardDraft::new("ok", "back"), CardDraft::new("   ", "back")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BulkReplaceError::Validation(_)));

        let live = repo.cards_for_deck(deck_id).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].content().front(), "keep");
        assert!(!repo.is_soft_deleted(live[0].id()).unwrap());
    }

    #[tokio::test]
    async fn failed_insert_restores_the_old_cards() {
        let inner = InMemoryRepository::new();
        let deck_id = seed(&inner, &["survivor"]).await;

        let repo = FaultyRepository {
            inner: inner.clone(),
            fail_insert: true,
            fail_restore: false,
        };
        let service = BulkReplaceService::new(Arc::new(repo)).with_clock(fixed_clock());

        let err = service
            .replace_deck_cards(deck_id, vec![CardDraft::new("never", "back")])
            .await
            .unwrap_err();

        assert!(matches!(err, BulkReplaceError::RolledBack { .. }));

        let live = inner.cards_for_deck(deck_id).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].content().front(), "survivor");
    }

    #[tokio::test]
    async fn failed_restore_is_reported_distinctly() {
        let inner = InMemoryRepository::new();
        let deck_id = seed(&inner, &["stranded"]).await;

        let repo = FaultyRepository {
            inner: inner.clone(),
            fail_insert: true,
            fail_restore: true,
        };
        let service = BulkReplaceService::new(Arc::new(repo)).with_clock(fixed_clock());

        let err = service
            .replace_deck_cards(deck_id, vec![CardDraft::new("never", "back")])
            .await
            .unwrap_err();

        assert!(matches!(err, BulkReplaceError::RollbackFailed { .. }));

        // The deck is left without live cards; the row is still there,
        // soft-deleted.
        assert!(inner.cards_for_deck(deck_id).await.unwrap().is_empty());
        assert!(inner.is_soft_deleted(CardId::new(1)).unwrap());
    }
}
