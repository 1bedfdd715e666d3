//! Session actor message types and render projections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::entities::{Card, CardId, CardKind, Color, Player, PlayerId, Role};
use crate::game::{DecisionKind, GameState, UserError};

/// Messages that can be sent to a [`super::SessionActor`].
#[derive(Debug)]
pub enum SessionMessage {
    /// Seat a player in the lobby.
    Join {
        identity: PlayerId,
        response: oneshot::Sender<Result<(), UserError>>,
    },

    /// Unseat a lobby player.
    Leave {
        identity: PlayerId,
        response: oneshot::Sender<Result<(), UserError>>,
    },

    /// Host starts the game.
    Start {
        identity: PlayerId,
        response: oneshot::Sender<Result<(), UserError>>,
    },

    /// Play a card out of the sender's hand.
    PlayCard {
        identity: PlayerId,
        card: CardId,
        response: oneshot::Sender<ActionAck>,
    },

    /// Draw one card and pass the turn.
    DrawCard {
        identity: PlayerId,
        response: oneshot::Sender<ActionAck>,
    },

    /// Answer an outstanding color-choice prompt.
    SubmitColor {
        identity: PlayerId,
        color: Color,
        response: oneshot::Sender<ActionAck>,
    },

    /// Answer an outstanding challenge prompt.
    SubmitChallenge {
        identity: PlayerId,
        challenge: bool,
        response: oneshot::Sender<ActionAck>,
    },

    /// Get the shared session view.
    GetState {
        response: oneshot::Sender<SessionStateView>,
    },

    /// Get one player's private hand view.
    GetHand {
        identity: PlayerId,
        response: oneshot::Sender<Option<HandView>>,
    },

    /// Move one player's hand-view pagination cursor.
    SetHandPage {
        identity: PlayerId,
        page: usize,
        response: oneshot::Sender<ActionAck>,
    },

    /// Host tears the session down early.
    Delete {
        identity: PlayerId,
        response: oneshot::Sender<Result<(), UserError>>,
    },

    /// Subscribe to state change notifications.
    Subscribe {
        identity: PlayerId,
        sender: mpsc::Sender<SessionNotification>,
    },

    /// Unsubscribe from state change notifications.
    Unsubscribe { identity: PlayerId },
}

/// Acknowledgement for play/draw/decision requests. `Ignored` is silent
/// by design: it covers out-of-turn actions, illegal cards, and stale
/// decision responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionAck {
    Accepted,
    Ignored,
}

impl ActionAck {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Notification pushed to subscribers when session state changes.
#[derive(Clone, Debug)]
pub enum SessionNotification {
    /// Something visible changed; re-render from the state view.
    StateChanged,

    /// A specific player owes an answer to a prompt.
    DecisionRequested {
        player: PlayerId,
        kind: DecisionKind,
    },

    /// A hand reached zero; the session is frozen and unregistered.
    GameEnded {
        winner: PlayerId,
        standings: Vec<Standing>,
    },
}

/// One row of the final scoreboard.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Standing {
    pub player: PlayerId,
    pub cards_left: usize,
}

/// A card as the rendering collaborator sees it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub label: String,
    pub color: Option<Color>,
    pub kind: CardKind,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            label: card.to_string(),
            color: card.color,
            kind: card.kind,
        }
    }
}

/// Public per-player row in the shared view. Hand contents stay private;
/// only the count is exposed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub hand_size: usize,
    pub role: Role,
    pub is_current: bool,
}

/// The shared, spoiler-free projection of a session. Pure read; pulling
/// it never mutates the session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStateView {
    pub session_id: Uuid,
    pub state: GameState,
    pub host: PlayerId,
    pub players: Vec<PlayerSummary>,
    pub current_player: Option<PlayerId>,
    pub top_card: Option<CardView>,
    pub current_color: Option<Color>,
    pub reversed: bool,
    pub uno: bool,
    pub awaiting_decision: Option<(PlayerId, DecisionKind)>,
    pub winner: Option<PlayerId>,
    pub draw_pile_size: usize,
    pub discard_pile_size: usize,
    pub created_at: DateTime<Utc>,
}

/// One player's private hand plus their pagination cursor. The rendering
/// collaborator slices `cards` into pages of `page_size`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HandView {
    pub cards: Vec<CardView>,
    pub page: usize,
    pub page_size: usize,
    pub your_turn: bool,
}

impl HandView {
    pub(crate) fn new(player: &Player, your_turn: bool, page_size: usize) -> Self {
        Self {
            cards: player.hand.iter().map(CardView::from).collect(),
            page: player.page,
            page_size,
            your_turn,
        }
    }
}
