//! Card catalog - the fixed set of card types.
//!
//! One bomb type, one rescue type, one cancel type, several single-effect
//! types and five collectible types that only play as matching sets.
//! Display names and rule text are static catalog data.

use serde::{Deserialize, Serialize};

/// Type of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Bomb,
    Rescue,
    Cancel,
    ExtraTurn,
    EndTurn,
    Gift,
    Reshuffle,
    Peek,
    Reverse,
    DrawFromBottom,
    Reorder,
    Bury,
    Taco,
    Rainbow,
    Beard,
    Melon,
    Potato,
}

impl CardType {
    /// Every card type in catalog order.
    pub const ALL: [CardType; 17] = [
        CardType::Bomb,
        CardType::Rescue,
        CardType::Cancel,
        CardType::ExtraTurn,
        CardType::EndTurn,
        CardType::Gift,
        CardType::Reshuffle,
        CardType::Peek,
        CardType::Reverse,
        CardType::DrawFromBottom,
        CardType::Reorder,
        CardType::Bury,
        CardType::Taco,
        CardType::Rainbow,
        CardType::Beard,
        CardType::Melon,
        CardType::Potato,
    ];

    /// Collectible types, playable only as matching sets.
    pub const COLLECTIBLES: [CardType; 5] = [
        CardType::Taco,
        CardType::Rainbow,
        CardType::Beard,
        CardType::Melon,
        CardType::Potato,
    ];

    /// Check if this type only plays as part of a matching set.
    #[must_use]
    pub const fn is_collectible(self) -> bool {
        matches!(
            self,
            CardType::Taco | CardType::Rainbow | CardType::Beard | CardType::Melon | CardType::Potato
        )
    }

    /// Bomb and rescue are never dealt from the regular deck.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, CardType::Bomb | CardType::Rescue)
    }

    /// Check if playing this card alone stages a deferred effect.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(
            self,
            CardType::ExtraTurn
                | CardType::EndTurn
                | CardType::Gift
                | CardType::Reshuffle
                | CardType::Peek
                | CardType::Reverse
                | CardType::DrawFromBottom
                | CardType::Reorder
                | CardType::Bury
        )
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            CardType::Bomb => "Bomb",
            CardType::Rescue => "Rescue",
            CardType::Cancel => "Cancel",
            CardType::ExtraTurn => "Extra Turn",
            CardType::EndTurn => "End Turn",
            CardType::Gift => "Gift",
            CardType::Reshuffle => "Reshuffle",
            CardType::Peek => "Peek",
            CardType::Reverse => "Reverse",
            CardType::DrawFromBottom => "Draw from Bottom",
            CardType::Reorder => "Reorder",
            CardType::Bury => "Bury",
            CardType::Taco => "Taco",
            CardType::Rainbow => "Rainbow",
            CardType::Beard => "Beard",
            CardType::Melon => "Melon",
            CardType::Potato => "Potato",
        }
    }

    /// Rule text shown on the card.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            CardType::Bomb => "You explode! Play a Rescue or you are out.",
            CardType::Rescue => "Survive a Bomb and put it back anywhere in the draw pile.",
            CardType::Cancel => "Stop any action card. Can itself be cancelled.",
            CardType::ExtraTurn => "End your turn without drawing. The next player takes 2 turns.",
            CardType::EndTurn => "End one turn without drawing a card.",
            CardType::Gift => "Another player must give you a card of their choice.",
            CardType::Reshuffle => "Shuffle the draw pile.",
            CardType::Peek => "Privately look at the top 3 cards of the draw pile.",
            CardType::Reverse => "Reverse the turn order.",
            CardType::DrawFromBottom => "Draw from the bottom of the draw pile instead of the top.",
            CardType::Reorder => "Look at the top 3 cards and put them back in any order.",
            CardType::Bury => "Put a card from your hand anywhere in the draw pile.",
            CardType::Taco
            | CardType::Rainbow
            | CardType::Beard
            | CardType::Melon
            | CardType::Potato => {
                "Play 2 matching to steal a random card, or 3 to name the card you want."
            }
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
