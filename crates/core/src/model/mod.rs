mod card;
mod deck;
mod ids;
mod review;

pub use card::{Card, CardContent, CardDraft, CardValidationError, MAX_SIDE_CHARS};
pub use deck::{Category, CategoryError, Deck, DeckError};
pub use ids::{CardId, CategoryId, DeckId, ParseIdError};
pub use review::{ReviewError, ReviewOutcome};
