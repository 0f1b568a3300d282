#![forbid(unsafe_code)]

pub mod bulk_replace;
pub mod error;
pub mod queue;
pub mod review_service;
pub mod study_service;

pub use recall_core::Clock;

pub use bulk_replace::BulkReplaceService;
pub use error::{BulkReplaceError, ReviewServiceError, StudyError};
pub use queue::{QueueBuilder, StudyQueue, DEFAULT_HISTORY_CAPACITY, JITTER_MAX};
pub use review_service::ReviewService;
pub use study_service::StudyService;
