use recall_core::model::{Card, CardContent, CardId, DeckId};
use recall_core::scheduler::{ReviewStats, SchedulingState};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn deck_id_from_i64(v: i64) -> Result<DeckId, StorageError> {
    Ok(DeckId::new(i64_to_u64("deck_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<CardId, StorageError> {
    Ok(CardId::new(i64_to_u64("card_id", v)?))
}

pub(crate) fn card_id_to_i64(id: CardId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("card_id overflow".into()))
}

pub(crate) fn deck_id_to_i64(id: DeckId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("deck_id overflow".into()))
}

fn counter_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_card_row(row: &sqlx::sqlite::SqliteRow) -> Result<Card, StorageError> {
    let content = CardContent::from_persisted(
        row.try_get::<String, _>("front").map_err(ser)?,
        row.try_get::<String, _>("back").map_err(ser)?,
    )
    .map_err(ser)?;

    let stats = ReviewStats::from_counts(
        counter_from_i64("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        counter_from_i64("partial_count", row.try_get("partial_count").map_err(ser)?)?,
        counter_from_i64(
            "incorrect_count",
            row.try_get("incorrect_count").map_err(ser)?,
        )?,
    );

    // The stored total must agree with the outcome counters; a mismatch means
    // the row was written outside the ease update machinery.
    let review_count =
        counter_from_i64("review_count", row.try_get("review_count").map_err(ser)?)?;
    if review_count != stats.review_count() {
        return Err(StorageError::Serialization(format!(
            "review_count {review_count} does not match outcome counters {}",
            stats.review_count()
        )));
    }

    let scheduling = SchedulingState::from_persisted(
        row.try_get::<f64, _>("ease").map_err(ser)?,
        stats,
        row.try_get("last_reviewed").map_err(ser)?,
    );

    Ok(Card::from_persisted(
        card_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        deck_id_from_i64(row.try_get::<i64, _>("deck_id").map_err(ser)?)?,
        content,
        scheduling,
        row.try_get("created_at").map_err(ser)?,
    ))
}
