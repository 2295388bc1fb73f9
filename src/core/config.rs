//! Rule configuration.
//!
//! `GameConfig` holds the deck composition table, player range, hand size
//! and the real-time budgets of every pending phase. The engine never
//! hardcodes these numbers; the defaults reproduce the reference game.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::cards::CardType;

/// Rule configuration for one game.
///
/// ## Example
///
/// ```
/// use powderkeg::core::GameConfig;
///
/// let config = GameConfig::default().with_challenge_window_ms(1_500);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.rescue_total, 6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,

    /// Regular cards dealt to each player, not counting the rescue card.
    pub hand_size: usize,

    /// Rescue cards in the whole game. One goes to each player, the rest
    /// are shuffled into the draw pile.
    pub rescue_total: usize,

    /// Copies of each regular (non-bomb, non-rescue) card type.
    pub card_counts: Vec<(CardType, u32)>,

    /// How long a staged effect stays cancellable.
    pub challenge_window_ms: u64,

    /// Budget for choosing where a rescued bomb goes back.
    pub bomb_placement_ms: u64,

    /// How long peeked cards stay on display.
    pub peek_display_ms: u64,

    /// Budget for answering a gift, reorder or bury prompt.
    pub response_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 5,
            hand_size: 5,
            rescue_total: 6,
            card_counts: vec![
                (CardType::Cancel, 5),
                (CardType::ExtraTurn, 4),
                (CardType::EndTurn, 4),
                (CardType::Gift, 4),
                (CardType::Reshuffle, 4),
                (CardType::Peek, 5),
                (CardType::Taco, 4),
                (CardType::Rainbow, 4),
                (CardType::Beard, 4),
                (CardType::Melon, 4),
                (CardType::Potato, 4),
                (CardType::Reverse, 4),
                (CardType::DrawFromBottom, 4),
                (CardType::Reorder, 4),
                (CardType::Bury, 4),
            ],
            challenge_window_ms: 3_000,
            bomb_placement_ms: 30_000,
            peek_display_ms: 10_000,
            response_ms: 30_000,
        }
    }
}

impl GameConfig {
    /// Copies of a card type in the regular deck table.
    #[must_use]
    pub fn count_of(&self, card_type: CardType) -> u32 {
        self.card_counts
            .iter()
            .filter(|(t, _)| *t == card_type)
            .map(|(_, n)| *n)
            .sum()
    }

    /// Total regular cards in the table.
    #[must_use]
    pub fn regular_card_total(&self) -> usize {
        self.card_counts.iter().map(|(_, n)| *n as usize).sum()
    }

    /// Bombs in play for `player_count` players.
    #[must_use]
    pub fn bomb_count(&self, player_count: usize) -> usize {
        player_count.saturating_sub(1)
    }

    /// Check if a player count is inside the supported range.
    #[must_use]
    pub fn supports(&self, player_count: usize) -> bool {
        (self.min_players..=self.max_players).contains(&player_count)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 || self.max_players < self.min_players {
            return Err(ConfigError::PlayerRange {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.rescue_total < self.max_players {
            return Err(ConfigError::NotEnoughRescues {
                rescues: self.rescue_total,
                max_players: self.max_players,
            });
        }
        if let Some((card_type, _)) = self.card_counts.iter().find(|(t, _)| t.is_special()) {
            return Err(ConfigError::SpecialInTable(*card_type));
        }
        let needed = self.hand_size * self.max_players;
        if self.regular_card_total() < needed {
            return Err(ConfigError::DeckTooSmall {
                available: self.regular_card_total(),
                needed,
            });
        }
        if self.challenge_window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_players(mut self, min: usize, max: usize) -> Self {
        self.min_players = min;
        self.max_players = max;
        self
    }

    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    #[must_use]
    pub fn with_rescue_total(mut self, total: usize) -> Self {
        self.rescue_total = total;
        self
    }

    #[must_use]
    pub fn with_card_counts(mut self, counts: Vec<(CardType, u32)>) -> Self {
        self.card_counts = counts;
        self
    }

    #[must_use]
    pub fn with_challenge_window_ms(mut self, ms: u64) -> Self {
        self.challenge_window_ms = ms;
        self
    }

    #[must_use]
    pub fn with_bomb_placement_ms(mut self, ms: u64) -> Self {
        self.bomb_placement_ms = ms;
        self
    }

    #[must_use]
    pub fn with_peek_display_ms(mut self, ms: u64) -> Self {
        self.peek_display_ms = ms;
        self
    }

    #[must_use]
    pub fn with_response_ms(mut self, ms: u64) -> Self {
        self.response_ms = ms;
        self
    }
}
