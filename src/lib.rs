//! # powderkeg
//!
//! Rule engine and room orchestrator for a real-time, multiplayer
//! "draw until someone explodes" card game.
//!
//! ## Design Principles
//!
//! 1. **Snapshots In, Snapshots Out**: Every rule operation takes a
//!    `GameState` by reference and returns a new one. A rejected action
//!    leaves the caller's snapshot untouched.
//!
//! 2. **Effects Are Deferred**: Action cards stage their effect in a
//!    challenge window. Cancel plays are recorded, and the parity of the
//!    cancel count decides the outcome when the window closes.
//!
//! 3. **Time Is an Input**: The engine never reads a clock. Deadlines are
//!    plain data compared against the `now` the caller passes in, so a
//!    timer and a sweep can both close a window without racing.
//!
//! ## Modules
//!
//! - `core`: Players, state, actions, RNG, configuration, errors
//! - `cards`: Card catalog, card instances, deck construction and dealing
//! - `window`: Challenge windows, deferred effects and their resolution
//! - `rules`: The action state machine and turn bookkeeping
//! - `session`: Rooms, wire protocol, orchestrator and the async lobby
//!
//! ## Example
//!
//! ```
//! use powderkeg::{Action, Engine, GameConfig, PlayerId};
//!
//! let mut engine = Engine::with_seed(GameConfig::default(), 7);
//! let seats = vec![(PlayerId::new(0), "ada".to_string()), (PlayerId::new(1), "bo".to_string())];
//! let state = engine.new_game(&seats, 0).unwrap();
//!
//! let next = engine.apply(&state, PlayerId::new(0), &Action::Draw, 0).unwrap();
//! assert_eq!(next.draw_pile.len(), state.draw_pile.len() - 1);
//! ```

pub mod cards;
pub mod core;
pub mod rules;
pub mod session;
pub mod window;

pub use crate::cards::{Card, CardId, CardType};
pub use crate::core::{
    Action, ConfigError, GameConfig, GameRng, GameState, GameStatus, Phase, Player, PlayerId,
    RuleError, RuleResult, TurnDirection, TurnPhase,
};
pub use crate::rules::Engine;
pub use crate::session::{ClientIntent, LobbyHandle, Orchestrator, ServerEvent, SessionConfig, SessionError};
pub use crate::window::{DeferredEffect, PendingAction, WindowOutcome};
