//! Session actor with async message handling and decision deadlines.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, sleep_until};
use uuid::Uuid;

use super::SessionError;
use super::config::SessionConfig;
use super::messages::{
    ActionAck, CardView, HandView, PlayerSummary, SessionMessage, SessionNotification,
    SessionStateView, Standing,
};
use crate::game::constants::HAND_PAGE_SIZE;
use crate::game::entities::{CardId, Color, PlayerId};
use crate::game::{DecisionKind, DrawOutcome, Game, GameState, PlayOutcome, SubmitOutcome, UserError};

/// Inbox capacity per session. Inbound platform events are small and
/// bursty; 64 is plenty of headroom for one table of players.
const INBOX_CAPACITY: usize = 64;

/// Buffer for each subscriber's notification channel.
const NOTIFY_CAPACITY: usize = 32;

/// Session handle for sending messages to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: Uuid,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// True once the session's actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        message: SessionMessage,
        response: oneshot::Receiver<T>,
    ) -> Result<T, SessionError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }

    pub async fn join(&self, identity: PlayerId) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::Join { identity, response: tx }, rx)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn leave(&self, identity: PlayerId) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::Leave { identity, response: tx }, rx)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn start(&self, identity: PlayerId) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::Start { identity, response: tx }, rx)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn play_card(
        &self,
        identity: PlayerId,
        card: CardId,
    ) -> Result<ActionAck, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(
            SessionMessage::PlayCard {
                identity,
                card,
                response: tx,
            },
            rx,
        )
        .await
    }

    pub async fn draw_card(&self, identity: PlayerId) -> Result<ActionAck, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::DrawCard { identity, response: tx }, rx)
            .await
    }

    pub async fn submit_color_choice(
        &self,
        identity: PlayerId,
        color: Color,
    ) -> Result<ActionAck, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(
            SessionMessage::SubmitColor {
                identity,
                color,
                response: tx,
            },
            rx,
        )
        .await
    }

    pub async fn submit_challenge_choice(
        &self,
        identity: PlayerId,
        challenge: bool,
    ) -> Result<ActionAck, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(
            SessionMessage::SubmitChallenge {
                identity,
                challenge,
                response: tx,
            },
            rx,
        )
        .await
    }

    pub async fn state(&self) -> Result<SessionStateView, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::GetState { response: tx }, rx)
            .await
    }

    pub async fn hand(&self, identity: PlayerId) -> Result<Option<HandView>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::GetHand { identity, response: tx }, rx)
            .await
    }

    pub async fn set_hand_page(
        &self,
        identity: PlayerId,
        page: usize,
    ) -> Result<ActionAck, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(
            SessionMessage::SetHandPage {
                identity,
                page,
                response: tx,
            },
            rx,
        )
        .await
    }

    pub async fn delete(&self, identity: PlayerId) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionMessage::Delete { identity, response: tx }, rx)
            .await?
            .map_err(SessionError::from)
    }

    /// Register for notifications addressed to `identity`. The returned
    /// receiver is the render-target handle: it addresses outbound
    /// updates and controls nothing about the session's lifetime.
    pub async fn subscribe(
        &self,
        identity: PlayerId,
    ) -> Result<mpsc::Receiver<SessionNotification>, SessionError> {
        let (tx, rx) = mpsc::channel(NOTIFY_CAPACITY);
        self.sender
            .send(SessionMessage::Subscribe {
                identity,
                sender: tx,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(rx)
    }

    pub async fn unsubscribe(&self, identity: PlayerId) -> Result<(), SessionError> {
        self.sender
            .send(SessionMessage::Unsubscribe { identity })
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Actor owning one session's game state. All turn processing for the
/// session funnels through its inbox, so at most one resolution is in
/// flight at a time; a pending decision merely arms a deadline while the
/// inbox keeps serving reads and the eventual answer.
pub struct SessionActor {
    game: Game,
    config: SessionConfig,
    inbox: mpsc::Receiver<SessionMessage>,
    subscribers: HashMap<PlayerId, mpsc::Sender<SessionNotification>>,
    /// Mirror of the game's outstanding decision, used to detect when a
    /// new prompt opens and to re-arm the deadline.
    prompt: Option<(PlayerId, DecisionKind)>,
    deadline: Option<Instant>,
    closed: bool,
}

impl SessionActor {
    pub fn new(game: Game, config: SessionConfig) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let session_id = game.id();
        let actor = Self {
            game,
            config,
            inbox,
            subscribers: HashMap::new(),
            prompt: None,
            deadline: None,
            closed: false,
        };
        let handle = SessionHandle { sender, session_id };
        (actor, handle)
    }

    /// Run the session event loop until the game ends, the host deletes
    /// the session, or every handle is dropped.
    pub async fn run(mut self) {
        log::info!("session {} starting", self.game.id());

        loop {
            // The fallback keeps the sleep arm well-formed; the branch
            // guard disables it while no decision is outstanding.
            let deadline = self
                .deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => {
                        self.handle_message(message);
                        if self.closed {
                            break;
                        }
                    }
                    None => break,
                },

                _ = sleep_until(deadline), if self.deadline.is_some() => {
                    self.handle_decision_timeout();
                    if self.closed {
                        break;
                    }
                }
            }
        }

        log::info!("session {} closed", self.game.id());
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join { identity, response } => {
                let result = self.game.join(identity.clone());
                if result.is_ok() {
                    log::info!("{} joined session {}", identity, self.game.id());
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            SessionMessage::Leave { identity, response } => {
                let result = self.game.leave(&identity);
                if result.is_ok() {
                    log::info!("{} left session {}", identity, self.game.id());
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            SessionMessage::Start { identity, response } => {
                let result = self.game.start(&identity);
                if result.is_ok() {
                    log::info!(
                        "session {} started with {} players",
                        self.game.id(),
                        self.game.players().len()
                    );
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            SessionMessage::PlayCard {
                identity,
                card,
                response,
            } => {
                let ack = match self.game.play_card(&identity, card) {
                    PlayOutcome::Ignored => ActionAck::Ignored,
                    PlayOutcome::Played | PlayOutcome::AwaitingDecision => {
                        self.after_mutation();
                        ActionAck::Accepted
                    }
                };
                let _ = response.send(ack);
            }

            SessionMessage::DrawCard { identity, response } => {
                let ack = match self.game.draw_card(&identity) {
                    DrawOutcome::Ignored => ActionAck::Ignored,
                    DrawOutcome::Drew => {
                        self.after_mutation();
                        ActionAck::Accepted
                    }
                };
                let _ = response.send(ack);
            }

            SessionMessage::SubmitColor {
                identity,
                color,
                response,
            } => {
                let ack = match self.game.submit_color_choice(&identity, color) {
                    SubmitOutcome::Ignored => ActionAck::Ignored,
                    SubmitOutcome::Applied => {
                        self.after_mutation();
                        ActionAck::Accepted
                    }
                };
                let _ = response.send(ack);
            }

            SessionMessage::SubmitChallenge {
                identity,
                challenge,
                response,
            } => {
                let ack = match self.game.submit_challenge_choice(&identity, challenge) {
                    SubmitOutcome::Ignored => ActionAck::Ignored,
                    SubmitOutcome::Applied => {
                        self.after_mutation();
                        ActionAck::Accepted
                    }
                };
                let _ = response.send(ack);
            }

            SessionMessage::GetState { response } => {
                let _ = response.send(self.state_view());
            }

            SessionMessage::GetHand { identity, response } => {
                let playing = self.game.state() == GameState::Playing;
                let view = self.game.player(&identity).map(|player| {
                    let your_turn = playing && self.game.current_player().id == identity;
                    HandView::new(player, your_turn, HAND_PAGE_SIZE)
                });
                let _ = response.send(view);
            }

            SessionMessage::SetHandPage {
                identity,
                page,
                response,
            } => {
                let ack = if self.game.set_hand_page(&identity, page) {
                    ActionAck::Accepted
                } else {
                    ActionAck::Ignored
                };
                let _ = response.send(ack);
            }

            SessionMessage::Delete { identity, response } => {
                let result = if identity == *self.game.host() {
                    log::info!("session {} deleted by host", self.game.id());
                    self.closed = true;
                    Ok(())
                } else {
                    Err(UserError::NotHost)
                };
                let _ = response.send(result);
            }

            SessionMessage::Subscribe { identity, sender } => {
                log::debug!("{} subscribed to session {}", identity, self.game.id());
                self.subscribers.insert(identity, sender);
            }

            SessionMessage::Unsubscribe { identity } => {
                log::debug!("{} unsubscribed from session {}", identity, self.game.id());
                self.subscribers.remove(&identity);
            }
        }
    }

    /// Apply the documented default for the decision that just expired.
    fn handle_decision_timeout(&mut self) {
        if let Some((player, kind)) = self.prompt.clone() {
            log::debug!(
                "session {}: {kind:?} from {player} timed out, default applied",
                self.game.id()
            );
        }
        self.game.resolve_pending_default();
        self.after_mutation();
    }

    /// Bookkeeping after any state change: re-arm (or clear) the decision
    /// deadline, fan out the change, and freeze the session on a win.
    fn after_mutation(&mut self) {
        self.sync_decision_prompt();
        self.notify(SessionNotification::StateChanged);

        if self.game.state() == GameState::EndScreen && !self.closed {
            if let Some(winner) = self.game.winner().cloned() {
                log::info!("session {}: {winner} wins", self.game.id());
                let standings = self
                    .game
                    .standings()
                    .into_iter()
                    .map(|(player, cards_left)| Standing { player, cards_left })
                    .collect();
                self.notify(SessionNotification::GameEnded { winner, standings });
            }
            self.closed = true;
        }
    }

    fn sync_decision_prompt(&mut self) {
        let pending = self.game.pending_decision();
        if pending == self.prompt {
            return;
        }
        self.prompt = pending;
        match self.prompt.clone() {
            Some((player, kind)) => {
                self.deadline = Some(Instant::now() + self.config.decision_timeout);
                log::debug!(
                    "session {}: awaiting {kind:?} from {player}",
                    self.game.id()
                );
                self.notify(SessionNotification::DecisionRequested { player, kind });
            }
            None => self.deadline = None,
        }
    }

    /// Broadcast to subscribers, dropping the ones that went away.
    fn notify(&mut self, notification: SessionNotification) {
        self.subscribers
            .retain(|player, sender| match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("subscriber {player} channel full, dropping notification");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("subscriber {player} disconnected, removing");
                    false
                }
            });
    }

    fn state_view(&self) -> SessionStateView {
        let playing = self.game.state() == GameState::Playing;
        let players = self
            .game
            .players()
            .iter()
            .enumerate()
            .map(|(idx, player)| PlayerSummary {
                id: player.id.clone(),
                hand_size: player.hand.len(),
                role: player.role,
                is_current: playing && idx == self.game.current_turn(),
            })
            .collect();

        SessionStateView {
            session_id: self.game.id(),
            state: self.game.state(),
            host: self.game.host().clone(),
            players,
            current_player: playing.then(|| self.game.current_player().id.clone()),
            top_card: self.game.top_card().map(CardView::from),
            current_color: self.game.current_color(),
            reversed: self.game.reversed(),
            uno: self.game.uno(),
            awaiting_decision: self.game.pending_decision(),
            winner: self.game.winner().cloned(),
            draw_pile_size: self.game.draw_pile_size(),
            discard_pile_size: self.game.discard_pile_size(),
            created_at: self.game.created_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{pid, rig_game};
    use tokio::time::advance;

    fn spawn_rigged(hands: &[&[&str]], top: &str) -> SessionHandle {
        let game = rig_game(hands, top);
        let (actor, handle) = SessionActor::new(game, SessionConfig::default());
        tokio::spawn(actor.run());
        handle
    }

    async fn hand_card(handle: &SessionHandle, player: usize, label: &str) -> CardId {
        let hand = handle.hand(pid(player)).await.unwrap().unwrap();
        hand.cards
            .iter()
            .find(|c| c.label == label)
            .unwrap_or_else(|| panic!("{label} not in hand"))
            .id
    }

    #[tokio::test(start_paused = true)]
    async fn test_color_choice_timeout_defaults_to_red() {
        let handle = spawn_rigged(&[&["wild", "red-1"], &["green-7"]], "red-2");
        let card = hand_card(&handle, 0, "wild").await;
        assert_eq!(
            handle.play_card(pid(0), card).await.unwrap(),
            ActionAck::Accepted
        );

        let state = handle.state().await.unwrap();
        assert_eq!(
            state.awaiting_decision,
            Some((pid(0), DecisionKind::ColorChoice))
        );

        advance(Duration::from_secs(31)).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.awaiting_decision, None);
        assert_eq!(state.current_color, Some(Color::Red));
        assert_eq!(state.current_player, Some(pid(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_timeout_resolves_as_ignore() {
        let handle =
            spawn_rigged(&[&["wild-draw", "green-7"], &["red-9"], &["blue-4"]], "red-2");
        let card = hand_card(&handle, 0, "wild-draw").await;
        assert_eq!(
            handle.play_card(pid(0), card).await.unwrap(),
            ActionAck::Accepted
        );
        assert_eq!(
            handle
                .submit_color_choice(pid(0), Color::Green)
                .await
                .unwrap(),
            ActionAck::Accepted
        );

        let state = handle.state().await.unwrap();
        assert_eq!(
            state.awaiting_decision,
            Some((pid(1), DecisionKind::Challenge))
        );

        // Nobody answers: the challenge window closes as "ignore" and the
        // next player eats the four-card penalty plus their turn.
        advance(Duration::from_secs(31)).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.awaiting_decision, None);
        assert_eq!(state.players[1].hand_size, 5);
        assert_eq!(state.current_player, Some(pid(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_answer_after_timeout_is_ignored() {
        let handle = spawn_rigged(&[&["wild", "red-1"], &["green-7"]], "red-2");
        let card = hand_card(&handle, 0, "wild").await;
        handle.play_card(pid(0), card).await.unwrap();

        advance(Duration::from_secs(31)).await;

        assert_eq!(
            handle
                .submit_color_choice(pid(0), Color::Blue)
                .await
                .unwrap(),
            ActionAck::Ignored
        );
        let state = handle.state().await.unwrap();
        assert_eq!(state.current_color, Some(Color::Red));
    }

    #[tokio::test]
    async fn test_win_notifies_subscribers_and_closes_session() {
        let handle = spawn_rigged(&[&["red-5"], &["green-7"]], "red-2");
        let mut updates = handle.subscribe(pid(1)).await.unwrap();

        let card = hand_card(&handle, 0, "red-5").await;
        handle.play_card(pid(0), card).await.unwrap();

        let mut saw_game_end = false;
        while let Some(notification) = updates.recv().await {
            if let SessionNotification::GameEnded { winner, standings } = notification {
                assert_eq!(winner, pid(0));
                assert_eq!(standings[0].cards_left, 0);
                assert_eq!(standings[1].cards_left, 1);
                saw_game_end = true;
            }
        }
        assert!(saw_game_end);

        // the actor is gone; the handle reports the session as closed
        assert_eq!(handle.state().await, Err(SessionError::Closed));
    }

    #[tokio::test]
    async fn test_delete_is_host_only() {
        let handle = spawn_rigged(&[&["red-5"], &["green-7"]], "red-2");
        assert_eq!(
            handle.delete(pid(1)).await,
            Err(SessionError::Rejected(UserError::NotHost))
        );
        assert!(handle.delete(pid(0)).await.is_ok());
        assert_eq!(handle.draw_card(pid(0)).await, Err(SessionError::Closed));
    }
}
