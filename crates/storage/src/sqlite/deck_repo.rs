use recall_core::model::{Category, CategoryId, Deck, DeckId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{DeckRepository, StorageError};

#[async_trait::async_trait]
impl DeckRepository for SqliteRepository {
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO categories (id, name, display_order, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                display_order = excluded.display_order
            ",
        )
        .bind(
            i64::try_from(category.id().value())
                .map_err(|_| StorageError::Serialization("category_id overflow".into()))?,
        )
        .bind(category.name().to_owned())
        .bind(i64::from(category.display_order()))
        .bind(category.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO decks (id, category_id, name, display_order, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                name = excluded.name,
                display_order = excluded.display_order
            ",
        )
        .bind(
            i64::try_from(deck.id().value())
                .map_err(|_| StorageError::Serialization("deck_id overflow".into()))?,
        )
        .bind(
            i64::try_from(deck.category_id().value())
                .map_err(|_| StorageError::Serialization("category_id overflow".into()))?,
        )
        .bind(deck.name().to_owned())
        .bind(i64::from(deck.display_order()))
        .bind(deck.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, category_id, name, display_order, created_at
            FROM decks WHERE id = ?1
            ",
        )
        .bind(
            i64::try_from(id.value())
                .map_err(|_| StorageError::Serialization("deck_id overflow".into()))?,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => deck_from_row(&row),
            None => Err(StorageError::NotFound),
        }
    }
}

fn deck_from_row(row: &SqliteRow) -> Result<Deck, StorageError> {
    Deck::new(
        DeckId::new(
            u64::try_from(row.try_get::<i64, _>("id").map_err(ser)?)
                .map_err(|_| StorageError::Serialization("deck_id sign overflow".into()))?,
        ),
        CategoryId::new(
            u64::try_from(row.try_get::<i64, _>("category_id").map_err(ser)?)
                .map_err(|_| StorageError::Serialization("category_id sign overflow".into()))?,
        ),
        row.try_get::<String, _>("name").map_err(ser)?,
        u32::try_from(row.try_get::<i64, _>("display_order").map_err(ser)?)
            .map_err(|_| StorageError::Serialization("display_order overflow".into()))?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}
