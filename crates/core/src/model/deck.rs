use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CategoryId, DeckId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named collection of cards, owned by a category.
///
/// `display_order` only affects how decks are listed in a UI; scheduling never
/// consults it. Card counts are derived aggregates and are not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    category_id: CategoryId,
    name: String,
    display_order: u32,
    created_at: DateTime<Utc>,
}

impl Deck {
    /// Creates a deck with a validated name.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if the name is blank.
    pub fn new(
        id: DeckId,
        category_id: CategoryId,
        name: impl Into<String>,
        display_order: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeckError::EmptyName);
        }
        Ok(Self {
            id,
            category_id,
            name,
            display_order,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn display_order(&self) -> u32 {
        self.display_order
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of decks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
    display_order: u32,
    created_at: DateTime<Utc>,
}

impl Category {
    /// Creates a category with a validated name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the name is blank.
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        display_order: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CategoryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            display_order,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn display_order(&self) -> u32 {
        self.display_order
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
