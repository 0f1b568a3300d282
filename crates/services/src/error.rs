//! Shared error types for the services crate.

use thiserror::Error;

use recall_core::model::CardValidationError;
use storage::repository::StorageError;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error("no cards available to study")]
    EmptyQueue,
    #[error(transparent)]
    Review(#[from] ReviewServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BulkReplaceService`.
///
/// The rollback variants are deliberately distinct: `RolledBack` means the
/// compensating restore succeeded and the deck is back to its previous cards;
/// `RollbackFailed` means the deck may be left empty and an operator has to
/// reconcile the soft-deleted rows by hand. The second case must never be
/// collapsed into the first.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BulkReplaceError {
    #[error("invalid replacement card: {0}")]
    Validation(#[from] CardValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("bulk insert failed; the previous cards were restored")]
    RolledBack {
        #[source]
        source: StorageError,
    },

    #[error("bulk insert failed ({insert}) and restoring the previous cards also failed ({restore})")]
    RollbackFailed {
        insert: StorageError,
        restore: StorageError,
    },
}
