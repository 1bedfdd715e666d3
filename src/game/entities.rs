use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::DECK_SIZE;

/// The four playable card colors. Wild cards carry no color of their own;
/// the color they impose lives on the session as the "current color".
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
}

impl Color {
    pub const ALL: [Self; 4] = [Self::Red, Self::Yellow, Self::Green, Self::Blue];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
        };
        write!(f, "{repr}")
    }
}

/// Card identity beyond its color. Built once at catalog generation;
/// legality checks never parse card names.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CardKind {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardKind {
    pub fn is_wild(self) -> bool {
        matches!(self, Self::Wild | Self::WildDrawFour)
    }
}

/// Per-instance card ID, assigned sequentially at deck generation so that
/// the duplicates of one archetype stay individually referenceable.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CardId(pub u16);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An immutable card instance. A card is owned by exactly one of the draw
/// pile, the discard pile, or a player's hand at any moment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub color: Option<Color>,
    pub kind: CardKind,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match (self.color, self.kind) {
            (_, CardKind::Wild) => "wild".to_string(),
            (_, CardKind::WildDrawFour) => "wild-draw".to_string(),
            (Some(color), CardKind::Number(rank)) => format!("{color}-{rank}"),
            (Some(color), CardKind::Skip) => format!("{color}-skip"),
            (Some(color), CardKind::Reverse) => format!("{color}-reverse"),
            (Some(color), CardKind::DrawTwo) => format!("{color}-draw"),
            // colorless non-wilds are never generated
            (None, kind) => format!("{kind:?}"),
        };
        write!(f, "{repr}")
    }
}

/// Generate the fixed 108-card catalog: per color, rank 0 once and ranks
/// 1-9 twice, Skip/Reverse/DrawTwo twice each; Wild and WildDrawFour four
/// times each. Deterministic; randomness enters only via shuffling.
pub fn generate_deck() -> Vec<Card> {
    let mut cards: Vec<Card> = Vec::with_capacity(DECK_SIZE);

    fn push(cards: &mut Vec<Card>, color: Option<Color>, kind: CardKind, copies: usize) {
        for _ in 0..copies {
            cards.push(Card {
                id: CardId(cards.len() as u16),
                color,
                kind,
            });
        }
    }

    for color in Color::ALL {
        push(&mut cards, Some(color), CardKind::Number(0), 1);
        for rank in 1..=9 {
            push(&mut cards, Some(color), CardKind::Number(rank), 2);
        }
        push(&mut cards, Some(color), CardKind::Skip, 2);
        push(&mut cards, Some(color), CardKind::Reverse, 2);
        push(&mut cards, Some(color), CardKind::DrawTwo, 2);
    }
    push(&mut cards, None, CardKind::Wild, 4);
    push(&mut cards, None, CardKind::WildDrawFour, 4);

    cards
}

/// The session's shared card piles: the face-down draw pile (drawn from
/// the head) and the face-up discard pile (its last element is the active
/// top card). They live together because a short draw recycles one into
/// the other.
#[derive(Debug)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self {
            draw_pile: generate_deck(),
            discard_pile: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_piles(draw_pile: Vec<Card>, discard_pile: Vec<Card>) -> Self {
        Self {
            draw_pile,
            discard_pile,
        }
    }

    pub fn shuffle(&mut self) {
        self.draw_pile.shuffle(&mut rand::rng());
    }

    /// Remove up to `n` cards from the draw-pile head. A short pile first
    /// recycles the discard pile (everything but the top card) back into
    /// the draw pile; if the catalog is spread across hands and the draw
    /// still comes up short, the caller gets what's available.
    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        if self.draw_pile.len() < n {
            self.recycle();
        }
        let take = n.min(self.draw_pile.len());
        self.draw_pile.drain(..take).collect()
    }

    fn recycle(&mut self) {
        if self.discard_pile.len() <= 1 {
            return;
        }
        let keep = self.discard_pile.len() - 1;
        self.draw_pile.extend(self.discard_pile.drain(..keep));
        self.shuffle();
    }

    /// Seed the discard pile with the session's opening card. A wild can't
    /// define the opening color, so it goes back under a reshuffle until a
    /// Number/Skip/Reverse/DrawTwo surfaces.
    pub fn seed_discard(&mut self) {
        if !self.discard_pile.is_empty() {
            return;
        }
        if !self.draw_pile.iter().any(|card| !card.kind.is_wild()) {
            return;
        }
        loop {
            match self.draw_pile.first() {
                Some(card) if card.kind.is_wild() => self.shuffle(),
                Some(_) => {
                    let card = self.draw_pile.remove(0);
                    self.discard_pile.push(card);
                    return;
                }
                None => return,
            }
        }
    }

    /// The active top card that legal plays must match.
    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    /// Return a leaving player's cards to the draw pile.
    pub(crate) fn reclaim(&mut self, cards: Vec<Card>) {
        self.draw_pile.extend(cards);
        self.shuffle();
    }

    pub fn draw_pile_size(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_pile_size(&self) -> usize {
        self.discard_pile.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a chat-platform user inside a session. Opaque to the
/// engine; the platform collaborator decides what it encodes.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Normal,
}

/// A seated player: identity, owned hand, role, and the pagination cursor
/// for their hand view.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub hand: Vec<Card>,
    pub role: Role,
    pub page: usize,
}

impl Player {
    pub fn new(id: PlayerId, hand: Vec<Card>, role: Role) -> Self {
        Self {
            id,
            hand,
            role,
            page: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{ACTION_CARD_COUNT, NUMBER_CARD_COUNT, WILD_CARD_COUNT};
    use std::collections::HashSet;

    #[test]
    fn test_generated_deck_has_108_cards() {
        assert_eq!(generate_deck().len(), DECK_SIZE);
    }

    #[test]
    fn test_generated_deck_composition() {
        let deck = generate_deck();
        let numbers = deck
            .iter()
            .filter(|c| matches!(c.kind, CardKind::Number(_)))
            .count();
        let actions = deck
            .iter()
            .filter(|c| {
                matches!(
                    c.kind,
                    CardKind::Skip | CardKind::Reverse | CardKind::DrawTwo
                )
            })
            .count();
        let wilds = deck.iter().filter(|c| c.kind.is_wild()).count();
        assert_eq!(numbers, NUMBER_CARD_COUNT);
        assert_eq!(actions, ACTION_CARD_COUNT);
        assert_eq!(wilds, WILD_CARD_COUNT);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<CardId> = generate_deck().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn test_zero_appears_once_per_color() {
        let deck = generate_deck();
        for color in Color::ALL {
            let zeros = deck
                .iter()
                .filter(|c| c.color == Some(color) && c.kind == CardKind::Number(0))
                .count();
            assert_eq!(zeros, 1);
        }
    }

    #[test]
    fn test_card_labels_match_catalog_names() {
        let card = |color, kind| Card {
            id: CardId(0),
            color,
            kind,
        };
        assert_eq!(
            card(Some(Color::Blue), CardKind::Number(7)).to_string(),
            "blue-7"
        );
        assert_eq!(card(Some(Color::Red), CardKind::Skip).to_string(), "red-skip");
        assert_eq!(
            card(Some(Color::Yellow), CardKind::DrawTwo).to_string(),
            "yellow-draw"
        );
        assert_eq!(
            card(Some(Color::Green), CardKind::Reverse).to_string(),
            "green-reverse"
        );
        assert_eq!(card(None, CardKind::Wild).to_string(), "wild");
        assert_eq!(card(None, CardKind::WildDrawFour).to_string(), "wild-draw");
    }

    #[test]
    fn test_draw_comes_from_the_head() {
        let mut deck = Deck::new();
        let expected: Vec<CardId> = generate_deck().iter().take(3).map(|c| c.id).collect();
        let drawn: Vec<CardId> = deck.draw(3).iter().map(|c| c.id).collect();
        assert_eq!(drawn, expected);
        assert_eq!(deck.draw_pile_size(), DECK_SIZE - 3);
    }

    #[test]
    fn test_seed_discard_skips_wilds() {
        let mut deck = Deck::new();
        deck.shuffle();
        deck.seed_discard();
        let top = deck.top_card().expect("seeded");
        assert!(!top.kind.is_wild());
        assert_eq!(deck.draw_pile_size() + deck.discard_pile_size(), DECK_SIZE);
    }

    #[test]
    fn test_seed_discard_is_idempotent() {
        let mut deck = Deck::new();
        deck.seed_discard();
        let top = deck.top_card().cloned();
        deck.seed_discard();
        assert_eq!(deck.top_card().cloned(), top);
        assert_eq!(deck.discard_pile_size(), 1);
    }

    #[test]
    fn test_recycle_keeps_top_card_and_refills() {
        let mut deck = Deck::new();
        deck.seed_discard();
        // Pile most of the draw pile onto the discard, then ask for more
        // than what's left face down.
        for card in deck.draw(100) {
            deck.discard(card);
        }
        let top_before = deck.top_card().cloned().expect("top");
        let remaining = deck.draw_pile_size();
        let drawn = deck.draw(remaining + 5);
        assert_eq!(drawn.len(), remaining + 5);
        assert_eq!(deck.top_card().cloned(), Some(top_before));
        assert_eq!(
            deck.draw_pile_size() + deck.discard_pile_size() + drawn.len(),
            DECK_SIZE
        );
    }

    #[test]
    fn test_draw_never_errors_when_everything_is_exhausted() {
        let mut deck = Deck::new();
        deck.seed_discard();
        let everything = deck.draw(DECK_SIZE);
        assert_eq!(everything.len(), DECK_SIZE - 1);
        assert_eq!(deck.draw(4), vec![]);
        assert_eq!(deck.discard_pile_size(), 1);
    }
}
