//! Session configuration.

use std::time::Duration;

use super::error::{Result, SessionError};
use crate::core::GameConfig;

/// Room and timer policy for the orchestrator.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use powderkeg::session::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_seed(7)
///     .with_elimination_delay(Duration::from_millis(500));
/// assert_eq!(config.room_capacity, 5);
/// ```
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Rules for every game started in this lobby.
    pub game: GameConfig,

    pub room_capacity: usize,

    /// Pause between a certain elimination and applying it.
    pub elimination_delay: Duration,

    /// How long an active room with nobody connected is kept.
    pub reconnect_grace: Duration,

    /// How long a finished room stays around.
    pub finished_ttl: Duration,

    /// Interval of the expired-window sweep.
    pub sweep_interval: Duration,

    /// Capacity of the worker command channel.
    pub command_buffer: usize,

    /// Master RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            room_capacity: 5,
            elimination_delay: Duration::from_millis(1_000),
            reconnect_grace: Duration::from_secs(5 * 60),
            finished_ttl: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(2),
            command_buffer: 256,
            seed: None,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    #[must_use]
    pub fn with_room_capacity(mut self, capacity: usize) -> Self {
        self.room_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_elimination_delay(mut self, delay: Duration) -> Self {
        self.elimination_delay = delay;
        self
    }

    #[must_use]
    pub fn with_reconnect_grace(mut self, grace: Duration) -> Self {
        self.reconnect_grace = grace;
        self
    }

    #[must_use]
    pub fn with_finished_ttl(mut self, ttl: Duration) -> Self {
        self.finished_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the game rules and the settings the worker cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.game.validate()?;
        if self.sweep_interval.is_zero() {
            return Err(SessionError::ZeroSetting("sweep interval"));
        }
        if self.command_buffer == 0 {
            return Err(SessionError::ZeroSetting("command buffer"));
        }
        Ok(())
    }
}
