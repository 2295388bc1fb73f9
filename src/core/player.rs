//! Player identification and per-player game data.
//!
//! ## PlayerId
//!
//! Stable identifier for a seat in a room. It is assigned when a display
//! name first joins a room and survives reconnection: the transport-level
//! connection may change, the `PlayerId` does not.
//!
//! ## Player
//!
//! A seat's state inside a running game: hand, alive flag, owed turns.

use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardId, CardType};

/// Stable player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// A seat in a running game.
///
/// Hand order is display-only. Cards only ever move between a hand, the
/// draw pile and the discard pile; they are never duplicated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub is_alive: bool,
    /// Turns still owed before play passes on. Source of turn stacking.
    pub turns_remaining: u32,
    pub is_current_turn: bool,
}

impl Player {
    /// Create a living player with an empty hand.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hand: Vec::new(),
            is_alive: true,
            turns_remaining: 0,
            is_current_turn: false,
        }
    }

    /// Position of a card in hand.
    #[must_use]
    pub fn find_card(&self, card_id: CardId) -> Option<usize> {
        self.hand.iter().position(|c| c.id == card_id)
    }

    /// Check whether the hand holds a specific card.
    #[must_use]
    pub fn holds(&self, card_id: CardId) -> bool {
        self.find_card(card_id).is_some()
    }

    /// Check whether the hand holds any card of a type.
    #[must_use]
    pub fn holds_type(&self, card_type: CardType) -> bool {
        self.hand.iter().any(|c| c.card_type == card_type)
    }

    /// Remove a card from hand by ID.
    ///
    /// Returns the card if it was found.
    pub fn take_card(&mut self, card_id: CardId) -> Option<Card> {
        let pos = self.find_card(card_id)?;
        Some(self.hand.remove(pos))
    }

    /// Remove the first card of a type from hand.
    pub fn take_type(&mut self, card_type: CardType) -> Option<Card> {
        let pos = self.hand.iter().position(|c| c.card_type == card_type)?;
        Some(self.hand.remove(pos))
    }

    /// Number of cards in hand.
    #[must_use]
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }
}
