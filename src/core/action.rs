//! Player actions accepted by the rule engine.
//!
//! An `Action` is the verb plus whatever card ids, target or position it
//! needs. The actor is passed alongside, never inside, so the same action
//! value means the same thing whoever sends it.
//!
//! ## Example
//!
//! ```
//! use powderkeg::cards::CardId;
//! use powderkeg::core::{Action, PlayerId};
//!
//! let steal = Action::play_set(&[CardId::new(4), CardId::new(9)], PlayerId::new(2));
//! assert_eq!(steal.name(), "play-matching-set");
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::PlayerId;
use crate::cards::{CardId, CardType};

/// A game action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Action {
    /// Take the front card of the draw pile.
    Draw,

    /// Play a single card. `target` is required by gift only.
    PlayCard {
        card: CardId,
        #[serde(default)]
        target: Option<PlayerId>,
    },

    /// Play 2 or 3 identical collectibles to steal from `target`.
    PlayMatchingSet {
        cards: SmallVec<[CardId; 3]>,
        target: PlayerId,
        #[serde(default)]
        chosen_type: Option<CardType>,
    },

    /// Put the rescued bomb back at `position` (0 = next drawn).
    PlaceBomb { position: usize },

    /// Hand a card to the player who asked for a gift.
    RespondToGift { card: CardId },

    /// New order of the top cards of the draw pile, front first.
    Reorder { order: SmallVec<[CardId; 3]> },

    /// Hide a card from hand in the draw pile at `position`.
    Bury { card: CardId, position: usize },
}

impl Action {
    #[must_use]
    pub fn play(card: CardId) -> Self {
        Action::PlayCard { card, target: None }
    }

    #[must_use]
    pub fn play_at(card: CardId, target: PlayerId) -> Self {
        Action::PlayCard {
            card,
            target: Some(target),
        }
    }

    #[must_use]
    pub fn play_set(cards: &[CardId], target: PlayerId) -> Self {
        Action::PlayMatchingSet {
            cards: SmallVec::from_slice(cards),
            target,
            chosen_type: None,
        }
    }

    #[must_use]
    pub fn play_triple(cards: &[CardId], target: PlayerId, chosen_type: CardType) -> Self {
        Action::PlayMatchingSet {
            cards: SmallVec::from_slice(cards),
            target,
            chosen_type: Some(chosen_type),
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::Draw => "draw",
            Action::PlayCard { .. } => "play-card",
            Action::PlayMatchingSet { .. } => "play-matching-set",
            Action::PlaceBomb { .. } => "place-bomb",
            Action::RespondToGift { .. } => "respond-to-gift",
            Action::Reorder { .. } => "reorder",
            Action::Bury { .. } => "bury",
        }
    }
}
