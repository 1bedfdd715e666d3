//! Card resolution engine: the legality rule, the play and draw
//! protocols, and the out-of-band decision slots (wild color choice,
//! wild-draw-four challenge).

use serde::{Deserialize, Serialize};

use super::entities::{Card, CardId, CardKind, Color, PlayerId};
use super::{Game, GameState};

/// Color applied when a color-choice prompt times out.
pub const DEFAULT_WILD_COLOR: Color = Color::Red;

/// Whether `card` may land on `top`. Wilds are always playable; anything
/// else must match the top card's color or kind (number rank included).
/// When the top card is itself a wild, only the chosen color counts.
pub fn can_play(card: &Card, top: &Card, current_color: Option<Color>) -> bool {
    if card.kind.is_wild() {
        return true;
    }
    if top.kind.is_wild() {
        return current_color.is_some() && card.color == current_color;
    }
    card.color == top.color || card.kind == top.kind
}

/// Result of a play request. `Ignored` covers every silent rejection:
/// wrong phase, outstanding decision, out of turn, card not in hand,
/// illegal card.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayOutcome {
    Ignored,
    /// The card resolved fully and the turn moved on.
    Played,
    /// The card is on the pile but resolution is suspended on a decision.
    AwaitingDecision,
}

/// Result of a draw request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DrawOutcome {
    Ignored,
    Drew,
}

/// Result of a decision response. Stale, duplicate, or misaddressed
/// responses are `Ignored`; the flow they targeted has already moved on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Ignored,
    Applied,
}

/// What an outstanding decision is asking for.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    ColorChoice,
    Challenge,
}

/// Everything needed to judge a wild-draw-four challenge later: the
/// discard card that was on top before the wild landed, and the color in
/// effect at that moment.
#[derive(Clone, Debug)]
pub(crate) struct ChallengeContext {
    pub(crate) beneath: Card,
    pub(crate) prior_color: Option<Color>,
}

/// The single outstanding decision slot. Taken (consumed) on the first
/// matching response or on timeout; anything arriving later finds it
/// empty and is dropped.
#[derive(Clone, Debug)]
pub(crate) enum PendingDecision {
    ColorChoice {
        player_idx: usize,
        /// Present when the wild was a draw-four: resolving the color
        /// opens the challenge window instead of finishing the play.
        draw_four: Option<ChallengeContext>,
    },
    Challenge {
        acting_idx: usize,
        target_idx: usize,
        ctx: ChallengeContext,
    },
}

impl Game {
    /// Resolve a play request from `who` for a card currently in their
    /// hand. Invalid requests are ignored with no state change.
    pub fn play_card(&mut self, who: &PlayerId, card_id: CardId) -> PlayOutcome {
        if self.state != GameState::Playing || self.pending.is_some() {
            return PlayOutcome::Ignored;
        }
        if self.current_player().id != *who {
            return PlayOutcome::Ignored;
        }
        let Some(top) = self.deck.top_card().cloned() else {
            return PlayOutcome::Ignored;
        };
        let idx = self.current_turn;
        let Some(pos) = self.players[idx].hand.iter().position(|c| c.id == card_id) else {
            return PlayOutcome::Ignored;
        };
        if !can_play(&self.players[idx].hand[pos], &top, self.current_color) {
            return PlayOutcome::Ignored;
        }

        let card = self.players[idx].hand.remove(pos);
        let kind = card.kind;
        self.deck.discard(card);

        match kind {
            CardKind::Number(_) => {
                self.current_color = None;
                self.advance_turn();
                self.finish_resolution(idx);
                PlayOutcome::Played
            }
            CardKind::Skip => {
                self.current_color = None;
                self.advance_turn();
                self.advance_turn();
                self.finish_resolution(idx);
                PlayOutcome::Played
            }
            CardKind::Reverse => {
                self.current_color = None;
                self.reversed = !self.reversed;
                // with two players the reverse comes straight back: a skip
                self.advance_turn();
                if self.players.len() == 2 {
                    self.advance_turn();
                }
                self.finish_resolution(idx);
                PlayOutcome::Played
            }
            CardKind::DrawTwo => {
                self.current_color = None;
                let target = self.next_index();
                let penalty = self.deck.draw(2);
                self.players[target].hand.extend(penalty);
                self.advance_turn();
                self.advance_turn();
                self.finish_resolution(idx);
                PlayOutcome::Played
            }
            CardKind::Wild => {
                self.pending = Some(PendingDecision::ColorChoice {
                    player_idx: idx,
                    draw_four: None,
                });
                PlayOutcome::AwaitingDecision
            }
            CardKind::WildDrawFour => {
                self.pending = Some(PendingDecision::ColorChoice {
                    player_idx: idx,
                    draw_four: Some(ChallengeContext {
                        beneath: top,
                        prior_color: self.current_color,
                    }),
                });
                PlayOutcome::AwaitingDecision
            }
        }
    }

    /// The current player draws one card and their turn passes.
    pub fn draw_card(&mut self, who: &PlayerId) -> DrawOutcome {
        if self.state != GameState::Playing || self.pending.is_some() {
            return DrawOutcome::Ignored;
        }
        if self.current_player().id != *who {
            return DrawOutcome::Ignored;
        }
        let idx = self.current_turn;
        let drawn = self.deck.draw(1);
        self.players[idx].hand.extend(drawn);
        self.uno = self.players[idx].hand.len() == 1;
        self.advance_turn();
        DrawOutcome::Drew
    }

    /// Route a color answer to the outstanding color choice, if `who` is
    /// the awaited responder.
    pub fn submit_color_choice(&mut self, who: &PlayerId, color: Color) -> SubmitOutcome {
        let awaited = match &self.pending {
            Some(PendingDecision::ColorChoice { player_idx, .. }) => *player_idx,
            _ => return SubmitOutcome::Ignored,
        };
        if self.players[awaited].id != *who {
            return SubmitOutcome::Ignored;
        }
        self.resolve_color_choice(color);
        SubmitOutcome::Applied
    }

    /// Route a challenge answer to the outstanding challenge window, if
    /// `who` is the awaited responder.
    pub fn submit_challenge_choice(&mut self, who: &PlayerId, challenge: bool) -> SubmitOutcome {
        let awaited = match &self.pending {
            Some(PendingDecision::Challenge { target_idx, .. }) => *target_idx,
            _ => return SubmitOutcome::Ignored,
        };
        if self.players[awaited].id != *who {
            return SubmitOutcome::Ignored;
        }
        self.resolve_challenge(challenge);
        SubmitOutcome::Applied
    }

    /// The awaited responder and decision kind, if a decision is
    /// outstanding.
    pub fn pending_decision(&self) -> Option<(PlayerId, DecisionKind)> {
        self.pending.as_ref().map(|pending| match pending {
            PendingDecision::ColorChoice { player_idx, .. } => (
                self.players[*player_idx].id.clone(),
                DecisionKind::ColorChoice,
            ),
            PendingDecision::Challenge { target_idx, .. } => {
                (self.players[*target_idx].id.clone(), DecisionKind::Challenge)
            }
        })
    }

    /// Resolve the outstanding decision with its documented default:
    /// red for a color choice, "don't challenge" for a challenge.
    pub fn resolve_pending_default(&mut self) {
        match &self.pending {
            Some(PendingDecision::ColorChoice { .. }) => {
                self.resolve_color_choice(DEFAULT_WILD_COLOR);
            }
            Some(PendingDecision::Challenge { .. }) => self.resolve_challenge(false),
            None => {}
        }
    }

    fn resolve_color_choice(&mut self, color: Color) {
        let Some(PendingDecision::ColorChoice {
            player_idx,
            draw_four,
        }) = self.pending.take()
        else {
            return;
        };
        self.current_color = Some(color);
        match draw_four {
            None => {
                self.advance_turn();
                self.finish_resolution(player_idx);
            }
            Some(ctx) => {
                self.pending = Some(PendingDecision::Challenge {
                    acting_idx: player_idx,
                    target_idx: self.next_index(),
                    ctx,
                });
            }
        }
    }

    fn resolve_challenge(&mut self, challenged: bool) {
        let Some(PendingDecision::Challenge {
            acting_idx,
            target_idx,
            ctx,
        }) = self.pending.take()
        else {
            return;
        };
        // Upheld iff the acting player still holds a card that was legal
        // against the discard card beneath the wild-draw-four.
        let upheld = challenged
            && self.players[acting_idx]
                .hand
                .iter()
                .any(|card| can_play(card, &ctx.beneath, ctx.prior_color));
        let loser = if upheld { acting_idx } else { target_idx };
        let penalty = self.deck.draw(4);
        self.players[loser].hand.extend(penalty);
        self.advance_turn();
        self.advance_turn();
        self.finish_resolution(acting_idx);
    }

    /// Post-effect bookkeeping: the UNO flag tracks the acting player's
    /// new hand size, and an empty hand ends the session.
    fn finish_resolution(&mut self, acting_idx: usize) {
        self.uno = self.players[acting_idx].hand.len() == 1;
        if self.players[acting_idx].hand.is_empty() {
            self.end_game(acting_idx);
        }
    }
}
