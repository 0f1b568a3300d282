use chrono::{DateTime, Utc};
use sqlx::Row;

use recall_core::model::{Card, CardContent, CardId, DeckId};
use recall_core::scheduler::SchedulingState;

use super::SqliteRepository;
use super::mapping::{card_id_from_i64, card_id_to_i64, deck_id_to_i64, map_card_row, ser};
use crate::repository::{CardRepository, StorageError};

const CARD_COLUMNS: &str = "id, deck_id, front, back, ease, correct_count, partial_count, \
     incorrect_count, review_count, last_reviewed, created_at";

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {CARD_COLUMNS}
            FROM cards
            WHERE deck_id = ?1 AND deleted_at IS NULL
            ORDER BY id ASC
            "
        ))
        .bind(deck_id_to_i64(deck_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut cards = Vec::with_capacity(rows.len());
        for row in rows {
            cards.push(map_card_row(&row)?);
        }
        Ok(cards)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, StorageError> {
        let row = sqlx::query(&format!(
            r"
            SELECT {CARD_COLUMNS}
            FROM cards
            WHERE id = ?1 AND deleted_at IS NULL
            "
        ))
        .bind(card_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_card_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn persist_scheduling(
        &self,
        id: CardId,
        scheduling: &SchedulingState,
    ) -> Result<Card, StorageError> {
        let stats = scheduling.stats();
        let result = sqlx::query(
            r"
            UPDATE cards SET
                ease = ?2,
                correct_count = ?3,
                partial_count = ?4,
                incorrect_count = ?5,
                review_count = ?6,
                last_reviewed = ?7
            WHERE id = ?1 AND deleted_at IS NULL
            ",
        )
        .bind(card_id_to_i64(id)?)
        .bind(scheduling.ease())
        .bind(i64::from(stats.correct_count()))
        .bind(i64::from(stats.partial_count()))
        .bind(i64::from(stats.incorrect_count()))
        .bind(i64::from(stats.review_count()))
        .bind(scheduling.last_reviewed())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_card(id).await
    }

    async fn insert_cards(
        &self,
        deck_id: DeckId,
        contents: &[CardContent],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError> {
        let deck = deck_id_to_i64(deck_id)?;
        let defaults = SchedulingState::new_card();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut inserted = Vec::with_capacity(contents.len());
        for content in contents {
            let res = sqlx::query(
                r"
                INSERT INTO cards (
                    deck_id, front, back, ease,
                    correct_count, partial_count, incorrect_count, review_count,
                    last_reviewed, created_at, deleted_at
                )
                VALUES (?1, ?2, ?3, ?4, 0, 0, 0, 0, NULL, ?5, NULL)
                ",
            )
            .bind(deck)
            .bind(content.front())
            .bind(content.back())
            .bind(defaults.ease())
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            let id = card_id_from_i64(res.last_insert_rowid())?;
            inserted.push(Card::new(id, deck_id, content.clone(), created_at));
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(inserted)
    }

    async fn soft_delete_cards(
        &self,
        deck_id: DeckId,
        deleted_at: DateTime<Utc>,
    ) -> Result<Vec<CardId>, StorageError> {
        let deck = deck_id_to_i64(deck_id)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let rows = sqlx::query(
            r"
            SELECT id FROM cards
            WHERE deck_id = ?1 AND deleted_at IS NULL
            ORDER BY id ASC
            ",
        )
        .bind(deck)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(card_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?);
        }

        sqlx::query(
            r"
            UPDATE cards SET deleted_at = ?2
            WHERE deck_id = ?1 AND deleted_at IS NULL
            ",
        )
        .bind(deck)
        .bind(deleted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(ids)
    }

    async fn restore_cards(&self, ids: &[CardId]) -> Result<Vec<CardId>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from("UPDATE cards SET deleted_at = NULL WHERE id IN (");
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push(')');

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(card_id_to_i64(*id)?);
        }

        let result = q
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Deleted rows stay queryable by id, so every requested id must match.
        if result.rows_affected() != ids.len() as u64 {
            return Err(StorageError::NotFound);
        }

        Ok(ids.to_vec())
    }
}
