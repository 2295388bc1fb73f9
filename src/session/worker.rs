//! Lobby worker: the single task that owns the orchestrator.
//!
//! Client intents, disconnects, timer firings and sweep ticks all arrive
//! through one command channel and are applied one at a time, so no two
//! operations on a room ever interleave. Timers are spawned tasks that
//! sleep and then send `TimerFired` back into the same channel through a
//! weak sender; they never keep the worker alive on their own.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::orchestrator::{Orchestrator, Outbound, Reaction, TimerDirective, TimerKey};
use super::protocol::{ClientIntent, ServerEvent};
use super::room::{ConnectionId, RoomId, RoomSummary};
use crate::core::GameState;

/// Commands processed by the lobby worker.
#[derive(Debug)]
pub enum Command {
    /// Register a connection and the channel its events go to.
    Connect {
        outbox: mpsc::UnboundedSender<ServerEvent>,
        reply: oneshot::Sender<ConnectionId>,
    },
    Intent {
        connection: ConnectionId,
        intent: ClientIntent,
    },
    Disconnect {
        connection: ConnectionId,
    },
    /// Deliver an event straight to one connection.
    Notify {
        connection: ConnectionId,
        event: ServerEvent,
    },
    TimerFired {
        key: TimerKey,
        generation: u64,
    },
    /// Unredacted room contents, for operators and tests.
    Inspect {
        room: RoomId,
        reply: oneshot::Sender<Option<RoomInspection>>,
    },
}

#[derive(Clone, Debug)]
pub struct RoomInspection {
    pub summary: RoomSummary,
    pub game: Option<GameState>,
}

/// Milliseconds since the Unix epoch, advanced by the tokio clock.
///
/// Anchored once at startup so paused-time tests stay deterministic.
#[derive(Debug)]
struct Clock {
    origin: Instant,
    epoch_ms: u64,
}

impl Clock {
    fn start() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        Self {
            origin: Instant::now(),
            epoch_ms,
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch_ms + self.origin.elapsed().as_millis() as u64
    }
}

/// Worker that owns the orchestrator and executes its reactions.
pub struct LobbyWorker {
    orchestrator: Orchestrator,
    commands: mpsc::Receiver<Command>,
    loopback: mpsc::WeakSender<Command>,
    outboxes: FxHashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    timers: FxHashMap<TimerKey, (u64, JoinHandle<()>)>,
    next_generation: u64,
    clock: Clock,
}

impl LobbyWorker {
    pub fn new(
        orchestrator: Orchestrator,
        commands: mpsc::Receiver<Command>,
        loopback: mpsc::WeakSender<Command>,
    ) -> Self {
        Self {
            orchestrator,
            commands,
            loopback,
            outboxes: FxHashMap::default(),
            timers: FxHashMap::default(),
            next_generation: 0,
            clock: Clock::start(),
        }
    }

    /// Main worker loop. Returns once every handle is dropped.
    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.orchestrator.config().sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = sweep.tick() => {
                    let reaction = self.orchestrator.sweep(self.clock.now_ms());
                    self.execute(reaction);
                }
            }
        }

        for (_, (_, timer)) in self.timers.drain() {
            timer.abort();
        }
        tracing::info!(target: "powderkeg::session", "lobby worker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let now = self.clock.now_ms();
        match command {
            Command::Connect { outbox, reply } => {
                let connection = self.orchestrator.connect();
                self.outboxes.insert(connection, outbox);
                let _ = reply.send(connection);
            }
            Command::Intent { connection, intent } => {
                let reaction = self.orchestrator.handle(connection, intent, now);
                self.execute(reaction);
            }
            Command::Disconnect { connection } => {
                self.outboxes.remove(&connection);
                let reaction = self.orchestrator.disconnect(connection);
                self.execute(reaction);
            }
            Command::Notify { connection, event } => {
                let mut reaction = Reaction::default();
                reaction.outbound.push(Outbound { to: connection, event });
                self.execute(reaction);
            }
            Command::TimerFired { key, generation } => {
                match self.timers.get(&key) {
                    Some((current, _)) if *current == generation => {
                        self.timers.remove(&key);
                    }
                    _ => {
                        tracing::trace!(target: "powderkeg::session", room = %key.room, kind = ?key.kind, "superseded timer");
                        return;
                    }
                }
                let reaction = self.orchestrator.timer_fired(&key, now);
                self.execute(reaction);
            }
            Command::Inspect { room, reply } => {
                let inspection = self.orchestrator.room(&room).map(|room| RoomInspection {
                    summary: room.summary(),
                    game: room.game.as_ref().map(|g| g.state.clone()),
                });
                let _ = reply.send(inspection);
            }
        }
    }

    fn execute(&mut self, reaction: Reaction) {
        for Outbound { to, event } in reaction.outbound {
            let Some(outbox) = self.outboxes.get(&to) else {
                continue;
            };
            if outbox.send(event).is_err() {
                tracing::trace!(target: "powderkeg::session", connection = %to, "outbox closed");
            }
        }
        for directive in reaction.timers {
            match directive {
                TimerDirective::Arm { key, after } => self.arm(key, after),
                TimerDirective::Disarm(key) => self.disarm(&key),
            }
        }
    }

    fn arm(&mut self, key: TimerKey, after: Duration) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let loopback = self.loopback.clone();
        let fired = key.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(commands) = loopback.upgrade() {
                let _ = commands
                    .send(Command::TimerFired {
                        key: fired,
                        generation,
                    })
                    .await;
            }
        });

        if let Some((_, previous)) = self.timers.insert(key, (generation, timer)) {
            previous.abort();
        }
    }

    fn disarm(&mut self, key: &TimerKey) {
        if let Some((_, timer)) = self.timers.remove(key) {
            timer.abort();
        }
    }
}
