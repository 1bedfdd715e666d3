//! Session layer: one tokio actor per running game plus the registry
//! that maps chat-platform origins to sessions.
//!
//! Each session runs in its own task with an mpsc inbox; the
//! [`SessionHandle`] wraps that inbox in typed async methods with
//! oneshot replies. Because the actor owns its [`crate::game::Game`]
//! outright, turn processing is serialized per session while independent
//! sessions run fully in parallel. Decision prompts (wild color choice,
//! draw-four challenge) suspend only their own session: the actor arms a
//! deadline and keeps serving reads until the awaited player answers or
//! the timeout default applies.

pub mod actor;
pub mod config;
pub mod messages;
pub mod registry;

pub use actor::{SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use messages::{
    ActionAck, CardView, HandView, PlayerSummary, SessionMessage, SessionNotification,
    SessionStateView, Standing,
};
pub use registry::{OriginKey, SessionRegistry};

use thiserror::Error;

use crate::game::UserError;

/// Failures at the session boundary. `Rejected` wraps the user-visible
/// rejections from the game itself; the rest are structural.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SessionError {
    #[error("couldn't create a session here")]
    CreationFailed,
    #[error("no session is running here")]
    NotFound,
    #[error("session has ended")]
    Closed,
    #[error(transparent)]
    Rejected(#[from] UserError),
}
