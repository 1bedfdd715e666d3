//! Fixed catalog numbers and gameplay defaults.

/// Total cards produced by deck generation.
pub const DECK_SIZE: usize = 108;

/// Number cards in the catalog (rank 0 once per color, 1-9 twice).
pub const NUMBER_CARD_COUNT: usize = 76;

/// Skip/Reverse/DrawTwo cards in the catalog (two of each per color).
pub const ACTION_CARD_COUNT: usize = 24;

/// Wild and WildDrawFour cards in the catalog (four of each).
pub const WILD_CARD_COUNT: usize = 8;

/// Cards dealt to every player when they enter the lobby.
pub const STARTING_HAND_SIZE: usize = 7;

/// Minimum players required to start a session.
pub const MIN_PLAYERS: usize = 2;

/// Default cap on session size. 14+ players could exhaust the catalog
/// before the discard pile is seeded.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Seconds a player has to answer a color-choice or challenge prompt.
pub const DECISION_TIMEOUT_SECS: u64 = 30;

/// Cards per page in the paginated hand view.
pub const HAND_PAGE_SIZE: usize = 10;
