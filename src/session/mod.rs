//! Rooms, the wire protocol and the turn/session orchestrator.
//!
//! ## Layers
//!
//! - `Orchestrator`: synchronous core. Owns rooms and engines, turns one
//!   input into a `Reaction` (events plus timer directives)
//! - `LobbyWorker`: async task that owns the orchestrator, delivers events
//!   and runs timers and the sweep
//! - `LobbyHandle`: cloneable front door used by transports

pub mod config;
pub mod error;
pub mod handle;
pub mod orchestrator;
pub mod protocol;
pub mod room;
pub mod view;
pub mod worker;

pub use config::SessionConfig;
pub use error::SessionError;
pub use handle::LobbyHandle;
pub use orchestrator::{Orchestrator, Outbound, Reaction, TimerDirective, TimerKey, TimerKind};
pub use protocol::{ClientIntent, ServerEvent};
pub use room::{ConnectionId, Room, RoomId, RoomPlayer, RoomStatus, RoomSummary};
pub use view::{GameView, PlayerView};
pub use worker::{Command, LobbyWorker, RoomInspection};
