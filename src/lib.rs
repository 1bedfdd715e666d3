//! # UNO Sessions
//!
//! A multiplayer UNO session engine designed to sit behind a chat
//! platform: the platform layer forwards player events (join, start,
//! play-card, draw, decision answers) and renders the projections this
//! crate hands back.
//!
//! ## Architecture
//!
//! The engine splits into two layers:
//!
//! - [`game`]: the pure, synchronous state machine: deck generation and
//!   recycling, hands, turn order, the card legality rule, per-card
//!   effects, and the decision slots for wild color choices and
//!   wild-draw-four challenges. A session moves through three states:
//!   `Lobby -> Playing -> EndScreen`.
//! - [`session`]: the async shell: one tokio actor per session
//!   serializing its turn processing, a deadline timer that resolves
//!   unanswered decision prompts with their defaults, notification
//!   fan-out for renderers, and a lock-guarded registry mapping platform
//!   origins (guilds/channels) to live sessions.
//!
//! ## Example
//!
//! ```
//! use uno_sessions::{Game, GameSettings, PlayerId};
//! use uuid::Uuid;
//!
//! let mut game = Game::new(
//!     Uuid::new_v4(),
//!     PlayerId::new("alice"),
//!     GameSettings::default(),
//! );
//! game.join(PlayerId::new("bob")).unwrap();
//! game.start(&PlayerId::new("alice")).unwrap();
//! assert_eq!(game.players().len(), 2);
//! assert!(game.top_card().is_some());
//! ```

/// Core game logic: cards, piles, players, and the resolution engine.
pub mod game;

/// Async session layer: actors, handles, and the origin registry.
pub mod session;

pub use game::{
    DEFAULT_WILD_COLOR, DecisionKind, DrawOutcome, Game, GameSettings, GameState, PlayOutcome,
    SubmitOutcome, UserError, can_play, constants,
    entities::{Card, CardId, CardKind, Color, Deck, Player, PlayerId, Role, generate_deck},
};
pub use session::{
    ActionAck, CardView, HandView, OriginKey, PlayerSummary, SessionActor, SessionConfig,
    SessionError, SessionHandle, SessionMessage, SessionNotification, SessionRegistry,
    SessionStateView, Standing,
};
