//! Core game types: players, state, actions, RNG, configuration, errors.
//!
//! Everything here is plain data. The rule engine in `rules` is the only
//! thing that moves a `GameState` from one snapshot to the next.

pub mod action;
pub mod config;
pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use action::Action;
pub use config::GameConfig;
pub use error::{ConfigError, RuleError, RuleResult};
pub use player::{Player, PlayerId};
pub use rng::GameRng;
pub use state::{GameState, GameStatus, Phase, TurnDirection, TurnPhase};
