//! Rule engine: the action state machine and turn advancement.
//!
//! `Engine` validates player actions against the current phase and
//! produces the next snapshot. `turns` holds the shared helpers for
//! passing the turn, spending owed turns and eliminating players.

pub mod engine;
pub mod turns;

pub use engine::Engine;
