//! UNO game state machine: deck, hands, turn order, and the play
//! resolution protocol.
//!
//! Everything in this module is synchronous and side-effect free beyond
//! its own state; the async session layer in [`crate::session`] wraps a
//! [`Game`] in an actor and drives decision timeouts. A session moves
//! `Lobby -> Playing -> EndScreen` and nothing leaves `EndScreen`.

pub mod constants;
pub mod entities;

mod actions;

pub use actions::{
    DEFAULT_WILD_COLOR, DecisionKind, DrawOutcome, PlayOutcome, SubmitOutcome, can_play,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use self::actions::PendingDecision;
use self::constants::{DEFAULT_MAX_PLAYERS, HAND_PAGE_SIZE, MIN_PLAYERS, STARTING_HAND_SIZE};
use self::entities::{Card, Color, Deck, Player, PlayerId, Role};

/// Errors surfaced to the acting user. Session state is unchanged when
/// one of these is returned.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("game already in progress")]
    GameAlreadyStarted,
    #[error("you're already in this game")]
    AlreadyJoined,
    #[error("game is full")]
    CapacityReached,
    #[error("only the host can do that")]
    NotHost,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("you're not in this game")]
    NotInGame,
    #[error("the host can't leave their own game")]
    HostCannotLeave,
}

/// Session lifecycle phase.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Lobby,
    Playing,
    EndScreen,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::EndScreen => "end screen",
        };
        write!(f, "{repr}")
    }
}

/// Game tunables. The defaults are the classic ruleset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_hand_size: usize,
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_hand_size: STARTING_HAND_SIZE,
            min_players: MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// One UNO session's authoritative state.
///
/// Owns the card piles and every player's hand; the conservation
/// invariant (`draw pile + discard pile + hands == 108`) holds across
/// every operation. At most one decision (color choice or challenge) is
/// outstanding at a time, and play/draw actions are ignored while one is.
#[derive(Debug)]
pub struct Game {
    id: Uuid,
    deck: Deck,
    players: Vec<Player>,
    current_turn: usize,
    reversed: bool,
    uno: bool,
    state: GameState,
    host: PlayerId,
    current_color: Option<Color>,
    winner: Option<PlayerId>,
    pending: Option<PendingDecision>,
    created_at: DateTime<Utc>,
    settings: GameSettings,
}

impl Game {
    /// Create a session in the lobby with the initiator as its dealt-in
    /// host.
    pub fn new(id: Uuid, host: PlayerId, settings: GameSettings) -> Self {
        let mut deck = Deck::new();
        deck.shuffle();
        let hand = deck.draw(settings.starting_hand_size);
        let players = vec![Player::new(host.clone(), hand, Role::Host)];
        Self {
            id,
            deck,
            players,
            current_turn: 0,
            reversed: false,
            uno: false,
            state: GameState::Lobby,
            host,
            current_color: None,
            winner: None,
            pending: None,
            created_at: Utc::now(),
            settings,
        }
    }

    /// Seat a player in the lobby and deal their starting hand.
    pub fn join(&mut self, id: PlayerId) -> Result<(), UserError> {
        if self.state != GameState::Lobby {
            return Err(UserError::GameAlreadyStarted);
        }
        if self.players.iter().any(|p| p.id == id) {
            return Err(UserError::AlreadyJoined);
        }
        if self.players.len() >= self.settings.max_players {
            return Err(UserError::CapacityReached);
        }
        let hand = self.deck.draw(self.settings.starting_hand_size);
        self.players.push(Player::new(id, hand, Role::Normal));
        Ok(())
    }

    /// Unseat a lobby player; their dealt cards go back into the draw
    /// pile. The host disbands via delete instead.
    pub fn leave(&mut self, id: &PlayerId) -> Result<(), UserError> {
        if self.state != GameState::Lobby {
            return Err(UserError::GameAlreadyStarted);
        }
        if *id == self.host {
            return Err(UserError::HostCannotLeave);
        }
        let Some(pos) = self.players.iter().position(|p| p.id == *id) else {
            return Err(UserError::NotInGame);
        };
        let player = self.players.remove(pos);
        self.deck.reclaim(player.hand);
        Ok(())
    }

    /// Host-only transition from lobby to play; seeds the discard pile so
    /// the opening top card is readable without mutation from then on.
    pub fn start(&mut self, id: &PlayerId) -> Result<(), UserError> {
        if self.state != GameState::Lobby {
            return Err(UserError::GameAlreadyStarted);
        }
        if *id != self.host {
            return Err(UserError::NotHost);
        }
        if self.players.len() < self.settings.min_players {
            return Err(UserError::NotEnoughPlayers);
        }
        self.state = GameState::Playing;
        self.deck.seed_discard();
        Ok(())
    }

    // Turn controller.

    /// Move the turn pointer one seat in the current direction.
    pub(crate) fn advance_turn(&mut self) {
        let len = self.players.len();
        if self.reversed {
            self.current_turn = if self.current_turn == 0 {
                len - 1
            } else {
                self.current_turn - 1
            };
        } else {
            self.current_turn = if self.current_turn + 1 >= len {
                0
            } else {
                self.current_turn + 1
            };
        }
    }

    /// Seat index of the neighbor the turn would advance to. Effects that
    /// punish "the next player" resolve this before advancing.
    pub fn next_index(&self) -> usize {
        let len = self.players.len();
        if self.reversed {
            (self.current_turn + len - 1) % len
        } else {
            (self.current_turn + 1) % len
        }
    }

    /// Seat index of the neighbor the turn last came from.
    pub fn previous_index(&self) -> usize {
        let len = self.players.len();
        if self.reversed {
            (self.current_turn + 1) % len
        } else {
            (self.current_turn + len - 1) % len
        }
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_turn]
    }

    pub fn next_player(&self) -> &Player {
        &self.players[self.next_index()]
    }

    pub fn previous_player(&self) -> &Player {
        &self.players[self.previous_index()]
    }

    pub(crate) fn end_game(&mut self, winner_idx: usize) {
        self.state = GameState::EndScreen;
        self.winner = Some(self.players[winner_idx].id.clone());
        self.uno = false;
        self.pending = None;
    }

    // Read projections. None of these mutate.

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn reversed(&self) -> bool {
        self.reversed
    }

    pub fn uno(&self) -> bool {
        self.uno
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn current_color(&self) -> Option<Color> {
        self.current_color
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.deck.top_card()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn draw_pile_size(&self) -> usize {
        self.deck.draw_pile_size()
    }

    pub fn discard_pile_size(&self) -> usize {
        self.deck.discard_pile_size()
    }

    /// Card census across piles and hands. Always the full catalog.
    pub fn total_cards(&self) -> usize {
        self.deck.draw_pile_size()
            + self.deck.discard_pile_size()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    /// Final per-player card counts, fewest first (the winner, once there
    /// is one, holds zero).
    pub fn standings(&self) -> Vec<(PlayerId, usize)> {
        let mut rows: Vec<_> = self
            .players
            .iter()
            .map(|p| (p.id.clone(), p.hand.len()))
            .collect();
        rows.sort_by_key(|(_, cards_left)| *cards_left);
        rows
    }

    /// Move a player's hand-view pagination cursor, clamped to their hand.
    pub fn set_hand_page(&mut self, id: &PlayerId, page: usize) -> bool {
        let Some(player) = self.players.iter_mut().find(|p| p.id == *id) else {
            return false;
        };
        let pages = player.hand.len().div_ceil(HAND_PAGE_SIZE).max(1);
        player.page = page.min(pages - 1);
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::entities::generate_deck;
    use super::*;

    fn take_labeled(pool: &mut Vec<Card>, label: &str) -> Card {
        let idx = pool
            .iter()
            .position(|c| c.to_string() == label)
            .unwrap_or_else(|| panic!("no {label} left in the pool"));
        pool.remove(idx)
    }

    /// Build a Playing-state game with fixed hands and a fixed top card.
    /// Player `i` is named `p{i}`; `p0` hosts and holds the turn. Cards
    /// are pulled from one generated catalog, so conservation holds by
    /// construction.
    pub(crate) fn rig_game(hands: &[&[&str]], top: &str) -> Game {
        let mut pool = generate_deck();
        let top_card = take_labeled(&mut pool, top);
        let players: Vec<Player> = hands
            .iter()
            .enumerate()
            .map(|(i, labels)| {
                let hand = labels
                    .iter()
                    .map(|label| take_labeled(&mut pool, label))
                    .collect();
                let role = if i == 0 { Role::Host } else { Role::Normal };
                Player::new(PlayerId::new(&format!("p{i}")), hand, role)
            })
            .collect();
        Game {
            id: Uuid::new_v4(),
            deck: Deck::from_piles(pool, vec![top_card]),
            players,
            current_turn: 0,
            reversed: false,
            uno: false,
            state: GameState::Playing,
            host: PlayerId::new("p0"),
            current_color: None,
            winner: None,
            pending: None,
            created_at: Utc::now(),
            settings: GameSettings::default(),
        }
    }

    pub(crate) fn pid(n: usize) -> PlayerId {
        PlayerId::new(&format!("p{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::rig_game;
    use super::*;

    #[test]
    fn test_new_game_deals_host_seven() {
        let game = Game::new(
            Uuid::new_v4(),
            PlayerId::new("host"),
            GameSettings::default(),
        );
        assert_eq!(game.state(), GameState::Lobby);
        assert_eq!(game.players().len(), 1);
        assert_eq!(game.players()[0].hand.len(), STARTING_HAND_SIZE);
        assert_eq!(game.players()[0].role, Role::Host);
        assert_eq!(game.total_cards(), constants::DECK_SIZE);
    }

    #[test]
    fn test_join_rules() {
        let mut game = Game::new(
            Uuid::new_v4(),
            PlayerId::new("host"),
            GameSettings::default(),
        );
        assert_eq!(game.join(PlayerId::new("bob")), Ok(()));
        assert_eq!(
            game.join(PlayerId::new("bob")),
            Err(UserError::AlreadyJoined)
        );
        game.start(&PlayerId::new("host")).unwrap();
        assert_eq!(
            game.join(PlayerId::new("carol")),
            Err(UserError::GameAlreadyStarted)
        );
    }

    #[test]
    fn test_join_respects_capacity() {
        let settings = GameSettings {
            max_players: 2,
            ..GameSettings::default()
        };
        let mut game = Game::new(Uuid::new_v4(), PlayerId::new("host"), settings);
        assert_eq!(game.join(PlayerId::new("bob")), Ok(()));
        assert_eq!(
            game.join(PlayerId::new("carol")),
            Err(UserError::CapacityReached)
        );
    }

    #[test]
    fn test_start_requires_host_and_two_players() {
        let mut game = Game::new(
            Uuid::new_v4(),
            PlayerId::new("host"),
            GameSettings::default(),
        );
        assert_eq!(
            game.start(&PlayerId::new("host")),
            Err(UserError::NotEnoughPlayers)
        );
        game.join(PlayerId::new("bob")).unwrap();
        assert_eq!(game.start(&PlayerId::new("bob")), Err(UserError::NotHost));
        assert_eq!(game.start(&PlayerId::new("host")), Ok(()));
        assert_eq!(game.state(), GameState::Playing);
        assert!(game.top_card().is_some());
        assert_eq!(
            game.start(&PlayerId::new("host")),
            Err(UserError::GameAlreadyStarted)
        );
    }

    #[test]
    fn test_two_player_bootstrap_leaves_93_in_deck() {
        let mut game = Game::new(
            Uuid::new_v4(),
            PlayerId::new("host"),
            GameSettings::default(),
        );
        game.join(PlayerId::new("bob")).unwrap();
        game.start(&PlayerId::new("host")).unwrap();
        assert_eq!(game.draw_pile_size(), 93);
        assert_eq!(game.discard_pile_size(), 1);
        assert_eq!(game.total_cards(), constants::DECK_SIZE);
    }

    #[test]
    fn test_leave_returns_cards_to_the_deck() {
        let mut game = Game::new(
            Uuid::new_v4(),
            PlayerId::new("host"),
            GameSettings::default(),
        );
        game.join(PlayerId::new("bob")).unwrap();
        let before = game.draw_pile_size();
        game.leave(&PlayerId::new("bob")).unwrap();
        assert_eq!(game.draw_pile_size(), before + STARTING_HAND_SIZE);
        assert_eq!(
            game.leave(&PlayerId::new("host")),
            Err(UserError::HostCannotLeave)
        );
        assert_eq!(game.leave(&PlayerId::new("bob")), Err(UserError::NotInGame));
    }

    #[test]
    fn test_advance_cycles_through_all_players() {
        let mut game = rig_game(&[&["red-1"], &["red-2"], &["red-3"]], "red-5");
        let start = game.current_turn();
        for _ in 0..game.players().len() {
            game.advance_turn();
            assert!(game.current_turn() < game.players().len());
        }
        assert_eq!(game.current_turn(), start);
    }

    #[test]
    fn test_advance_wraps_backwards_when_reversed() {
        let mut game = rig_game(&[&["red-1"], &["red-2"], &["red-3"]], "red-5");
        game.reversed = true;
        game.advance_turn();
        assert_eq!(game.current_turn(), 2);
        assert_eq!(game.next_index(), 1);
        assert_eq!(game.previous_index(), 0);
    }
}
