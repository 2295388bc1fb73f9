//! Orchestration errors.
//!
//! Rejected intents are reported to the originating connection only, as
//! an `error` event carrying the `Display` text.

use thiserror::Error;
use tokio::sync::oneshot;

use super::room::RoomId;
use crate::core::{ConfigError, RuleError};

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("room {room} not found")]
    RoomNotFound { room: RoomId },

    #[error("room is full")]
    RoomFull,

    #[error("game already in progress")]
    GameInProgress,

    #[error("only the host can start the game")]
    NotHost,

    #[error("all players must be ready")]
    NotAllReady,

    #[error("need at least {min} players to start")]
    InsufficientPlayers { min: usize },

    #[error("you are not in this room")]
    NotInRoom,

    #[error("game has not started")]
    GameNotStarted,

    #[error("lobby worker command channel closed")]
    CommandChannelClosed,

    #[error("lobby worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("invalid game configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0} must be positive")]
    ZeroSetting(&'static str),
}
