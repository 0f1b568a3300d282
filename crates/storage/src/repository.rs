use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use recall_core::model::{Card, CardContent, CardId, Category, CategoryId, Deck, DeckId};
use recall_core::scheduler::SchedulingState;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for cards.
///
/// These are the collaborator operations the scheduling engine consumes.
/// Soft deletion lives entirely behind this trait: live reads never return
/// deleted cards, and deleted rows stay addressable by id so a compensating
/// restore can bring them back.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Fetch all live cards in a deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError>;

    /// Fetch a single live card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card is missing or soft-deleted.
    async fn get_card(&self, id: CardId) -> Result<Card, StorageError>;

    /// Write back a card's scheduling state after a review.
    ///
    /// Returns the updated card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card is missing or soft-deleted.
    async fn persist_scheduling(
        &self,
        id: CardId,
        scheduling: &SchedulingState,
    ) -> Result<Card, StorageError>;

    /// Insert a batch of new cards with default scheduling state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any insert fails; no partial batch survives.
    async fn insert_cards(
        &self,
        deck_id: DeckId,
        contents: &[CardContent],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError>;

    /// Soft-delete every live card in a deck, returning the flagged ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn soft_delete_cards(
        &self,
        deck_id: DeckId,
        deleted_at: DateTime<Utc>,
    ) -> Result<Vec<CardId>, StorageError>;

    /// Clear the soft-delete flag for the given ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if any id does not exist.
    async fn restore_cards(&self, ids: &[CardId]) -> Result<Vec<CardId>, StorageError>;
}

/// Repository contract for decks and categories.
#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// Persist or update a category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the category cannot be stored.
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError>;

    /// Persist or update a deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deck cannot be stored.
    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError>;

    /// Fetch a deck by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_deck(&self, id: DeckId) -> Result<Deck, StorageError>;
}

/// Bundle of repositories handed to the service layer.
#[derive(Clone)]
pub struct Storage {
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Storage {
    /// Build a `Storage` backed by the in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            decks: Arc::new(repo.clone()),
            cards: Arc::new(repo),
        }
    }
}

//
// ─── IN-MEMORY REPOSITORY ──────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct StoredCard {
    card: Card,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    categories: HashMap<CategoryId, Category>,
    decks: HashMap<DeckId, Deck>,
    cards: HashMap<CardId, StoredCard>,
    next_card_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Test hook: whether a card row exists and is currently soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no row exists for the id.
    pub fn is_soft_deleted(&self, id: CardId) -> Result<bool, StorageError> {
        let guard = self.lock()?;
        guard
            .cards
            .get(&id)
            .map(|stored| stored.deleted_at.is_some())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        let guard = self.lock()?;
        let mut cards: Vec<Card> = guard
            .cards
            .values()
            .filter(|stored| stored.deleted_at.is_none() && stored.card.deck_id() == deck_id)
            .map(|stored| stored.card.clone())
            .collect();
        cards.sort_by_key(|c| c.id().value());
        Ok(cards)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, StorageError> {
        let guard = self.lock()?;
        match guard.cards.get(&id) {
            Some(stored) if stored.deleted_at.is_none() => Ok(stored.card.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    async fn persist_scheduling(
        &self,
        id: CardId,
        scheduling: &SchedulingState,
    ) -> Result<Card, StorageError> {
        let mut guard = self.lock()?;
        match guard.cards.get_mut(&id) {
            Some(stored) if stored.deleted_at.is_none() => {
                stored.card.set_scheduling(*scheduling);
                Ok(stored.card.clone())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn insert_cards(
        &self,
        deck_id: DeckId,
        contents: &[CardContent],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError> {
        let mut guard = self.lock()?;
        if !guard.decks.contains_key(&deck_id) {
            return Err(StorageError::NotFound);
        }

        let mut inserted = Vec::with_capacity(contents.len());
        for content in contents {
            guard.next_card_id += 1;
            let card = Card::new(
                CardId::new(guard.next_card_id),
                deck_id,
                content.clone(),
                created_at,
            );
            guard.cards.insert(
                card.id(),
                StoredCard {
                    card: card.clone(),
                    deleted_at: None,
                },
            );
            inserted.push(card);
        }
        Ok(inserted)
    }

    async fn soft_delete_cards(
        &self,
        deck_id: DeckId,
        deleted_at: DateTime<Utc>,
    ) -> Result<Vec<CardId>, StorageError> {
        let mut guard = self.lock()?;
        let mut ids = Vec::new();
        for stored in guard.cards.values_mut() {
            if stored.deleted_at.is_none() && stored.card.deck_id() == deck_id {
                stored.deleted_at = Some(deleted_at);
                ids.push(stored.card.id());
            }
        }
        ids.sort_by_key(CardId::value);
        Ok(ids)
    }

    async fn restore_cards(&self, ids: &[CardId]) -> Result<Vec<CardId>, StorageError> {
        let mut guard = self.lock()?;
        // Validate the whole batch before clearing any flag.
        if ids.iter().any(|id| !guard.cards.contains_key(id)) {
            return Err(StorageError::NotFound);
        }
        for id in ids {
            if let Some(stored) = guard.cards.get_mut(id) {
                stored.deleted_at = None;
            }
        }
        Ok(ids.to_vec())
    }
}

#[async_trait]
impl DeckRepository for InMemoryRepository {
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.categories.insert(category.id(), category.clone());
        Ok(())
    }

    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.decks.insert(deck.id(), deck.clone());
        Ok(())
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, StorageError> {
        let guard = self.lock()?;
        guard.decks.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
