//! Rule engine error types.
//!
//! Every `RuleError` is a recoverable validation failure: the operation is
//! rejected and the snapshot it was given is left untouched. The `Display`
//! text is what the originating player sees.

use thiserror::Error;

use super::state::TurnPhase;
use super::player::PlayerId;
use crate::cards::{CardId, CardType};

pub type RuleResult<T> = std::result::Result<T, RuleError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("game requires {min}-{max} players, got {got}")]
    InvalidPlayerCount { min: usize, max: usize, got: usize },

    #[error("{player} is not in this game")]
    PlayerNotFound { player: PlayerId },

    #[error("{player} has been eliminated")]
    PlayerEliminated { player: PlayerId },

    #[error("the game is over")]
    GameFinished,

    #[error("not allowed during {phase:?}")]
    WrongPhase { phase: TurnPhase },

    #[error("it is not {player}'s turn")]
    NotYourTurn { player: PlayerId },

    #[error("{card} is not in hand")]
    CardNotInHand { card: CardId },

    #[error("{card_type} cannot be played now")]
    NotPlayable { card_type: CardType },

    #[error("matching sets need 2 or 3 identical collectible cards")]
    MismatchedSet,

    #[error("a 3-card set must name the card type to steal")]
    MissingChosenType,

    #[error("invalid target")]
    InvalidTarget,

    #[error("target has no cards")]
    EmptyTargetHand,

    #[error("the challenge window has closed")]
    WindowExpired,

    #[error("reorder must list each revealed card exactly once")]
    InvalidOrder,

    #[error("position {position} is outside 0..={max}")]
    OutOfRangePosition { position: usize, max: usize },

    #[error("the draw pile is empty")]
    DeckExhausted,
}

/// Inconsistent `GameConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("player range {min}..={max} is invalid")]
    PlayerRange { min: usize, max: usize },

    #[error("{rescues} rescue cards cannot cover {max_players} players")]
    NotEnoughRescues { rescues: usize, max_players: usize },

    #[error("{0} cannot appear in the regular card table")]
    SpecialInTable(CardType),

    #[error("deck has {available} regular cards, dealing needs {needed}")]
    DeckTooSmall { available: usize, needed: usize },

    #[error("challenge window must be longer than zero")]
    ZeroWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = RuleError::InvalidPlayerCount { min: 2, max: 5, got: 7 };
        assert_eq!(err.to_string(), "game requires 2-5 players, got 7");

        let err = RuleError::OutOfRangePosition { position: 9, max: 4 };
        assert_eq!(err.to_string(), "position 9 is outside 0..=4");

        let err = RuleError::NotYourTurn { player: PlayerId::new(2) };
        assert_eq!(err.to_string(), "it is not Player 2's turn");
    }
}
