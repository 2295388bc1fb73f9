//! Synchronous orchestration core.
//!
//! The `Orchestrator` owns every room and its engine. It never performs
//! I/O and never sleeps: each call consumes one input (an intent, a
//! disconnect, a timer firing, a sweep tick) and returns a [`Reaction`]
//! listing the events to deliver and the timers to arm or disarm. The
//! async worker executes reactions; tests can drive the core directly.
//!
//! ## Timers
//!
//! At most one timer per (room, [`TimerKind`]). Every firing re-checks the
//! condition it was armed for, so a stale or early firing is harmless:
//! - `Window`: whatever pending action the room has. Early firings re-arm
//!   for the remainder.
//! - `Elimination`: the exploded player still has no rescue card.
//! - `ReconnectGrace`: the active room still has nobody connected.
//! - `FinishedTtl`: the room is still finished.

use std::time::Duration;

use rustc_hash::FxHashMap;

use super::config::SessionConfig;
use super::error::{Result, SessionError};
use super::protocol::{ClientIntent, ServerEvent};
use super::room::{ActiveGame, ConnectionId, Room, RoomId, RoomStatus, RoomSummary};
use super::view::GameView;
use crate::core::{Action, GameRng, PlayerId};
use crate::rules::Engine;
use crate::window::ExpiryOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    Window,
    Elimination,
    ReconnectGrace,
    FinishedTtl,
}

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::Window,
        TimerKind::Elimination,
        TimerKind::ReconnectGrace,
        TimerKind::FinishedTtl,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey {
    pub room: RoomId,
    pub kind: TimerKind,
}

impl TimerKey {
    #[must_use]
    pub fn new(room: RoomId, kind: TimerKind) -> Self {
        Self { room, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerDirective {
    /// Fire `key` after `after`, replacing any timer armed for it.
    Arm { key: TimerKey, after: Duration },
    Disarm(TimerKey),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub event: ServerEvent,
}

/// Side effects requested by one orchestrator call, in order.
#[derive(Clone, Debug, Default)]
pub struct Reaction {
    pub outbound: Vec<Outbound>,
    pub timers: Vec<TimerDirective>,
}

impl Reaction {
    fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        self.outbound.push(Outbound { to, event });
    }

    fn arm(&mut self, room: &RoomId, kind: TimerKind, after: Duration) {
        self.timers.push(TimerDirective::Arm {
            key: TimerKey::new(room.clone(), kind),
            after,
        });
    }

    fn disarm(&mut self, room: &RoomId, kind: TimerKind) {
        self.timers
            .push(TimerDirective::Disarm(TimerKey::new(room.clone(), kind)));
    }

    /// Events addressed to one connection.
    pub fn events_for(&self, connection: ConnectionId) -> impl Iterator<Item = &ServerEvent> {
        self.outbound
            .iter()
            .filter(move |o| o.to == connection)
            .map(|o| &o.event)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.timers.is_empty()
    }
}

/// How a `join-room` request seats its connection.
#[derive(Clone, Copy, Debug)]
enum Seating {
    Create,
    /// This connection already holds the seat.
    Already(PlayerId),
    Reconnect(PlayerId),
    Add,
}

/// Owner of all rooms and their engines.
#[derive(Debug)]
pub struct Orchestrator {
    config: SessionConfig,
    rooms: FxHashMap<RoomId, Room>,
    /// Every open connection and the room it is in.
    connections: FxHashMap<ConnectionId, Option<RoomId>>,
    next_connection: u64,
    rng: GameRng,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        Self {
            config,
            rooms: FxHashMap::default(),
            connections: FxHashMap::default(),
            next_connection: 0,
            rng,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Register a new transport connection.
    pub fn connect(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        self.connections.insert(id, None);
        tracing::trace!(target: "powderkeg::session", connection = %id, "connected");
        id
    }

    /// Drop a connection. Its seat, if any, is left as in `leave-room`.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Reaction {
        let mut reaction = Reaction::default();
        let Some(Some(room_id)) = self.connections.remove(&connection) else {
            return reaction;
        };

        let name = self
            .rooms
            .get(&room_id)
            .and_then(|room| room.member_by_connection(connection))
            .map(|p| p.name.clone());
        if self.leave(connection, &room_id, &mut reaction).is_err() {
            return reaction;
        }

        if let (Some(room), Some(player_name)) = (self.rooms.get(&room_id), name) {
            tracing::info!(target: "powderkeg::session", room = %room_id, player = %player_name, "player disconnected");
            for (_, to) in room.connections() {
                reaction.send(
                    to,
                    ServerEvent::PlayerDisconnected {
                        room_id: room_id.clone(),
                        player_name: player_name.clone(),
                    },
                );
            }
        }
        reaction
    }

    /// Handle one client intent.
    ///
    /// A rejected intent produces a single `error` event to the sender and
    /// changes nothing.
    pub fn handle(&mut self, connection: ConnectionId, intent: ClientIntent, now: u64) -> Reaction {
        let mut reaction = Reaction::default();
        if let Err(err) = self.dispatch(connection, intent, now, &mut reaction) {
            tracing::debug!(target: "powderkeg::session", %connection, error = %err, "intent rejected");
            reaction.send(connection, ServerEvent::error(&err));
        }
        reaction
    }

    /// Handle a timer firing.
    pub fn timer_fired(&mut self, key: &TimerKey, now: u64) -> Reaction {
        let mut reaction = Reaction::default();
        let room_id = &key.room;
        let Some(room) = self.rooms.get_mut(room_id) else {
            tracing::trace!(target: "powderkeg::session", room = %room_id, kind = ?key.kind, "timer for a closed room");
            return reaction;
        };

        match key.kind {
            TimerKind::Window => {
                let remaining = room
                    .game
                    .as_ref()
                    .and_then(|g| g.state.pending())
                    .map(|p| p.remaining_ms(now));
                match remaining {
                    Some(0) => self.progress(room_id, now, &mut reaction),
                    Some(ms) => {
                        tracing::trace!(target: "powderkeg::session", room = %room_id, remaining = ms, "window timer early");
                        reaction.arm(room_id, TimerKind::Window, Duration::from_millis(ms));
                    }
                    None => {
                        tracing::trace!(target: "powderkeg::session", room = %room_id, "stale window timer");
                    }
                }
            }
            TimerKind::Elimination => {
                room.elimination_armed = false;
                let Some(game) = room.game.as_mut() else {
                    return reaction;
                };
                let Some(player) = Engine::doomed_player(&game.state) else {
                    tracing::trace!(target: "powderkeg::session", room = %room_id, "stale elimination timer");
                    return reaction;
                };
                match game.engine.eliminate(&game.state, player) {
                    Ok(next) => {
                        game.state = next;
                        tracing::info!(target: "powderkeg::session", room = %room_id, %player, "player eliminated");
                        self.progress(room_id, now, &mut reaction);
                    }
                    Err(err) => {
                        tracing::debug!(target: "powderkeg::session", room = %room_id, error = %err, "elimination skipped");
                    }
                }
            }
            TimerKind::ReconnectGrace => {
                if room.status == RoomStatus::Active && room.connected_count() == 0 {
                    tracing::info!(target: "powderkeg::session", room = %room_id, "reconnect grace elapsed");
                    self.destroy_room(room_id, &mut reaction);
                }
            }
            TimerKind::FinishedTtl => {
                if room.status == RoomStatus::Finished {
                    self.destroy_room(room_id, &mut reaction);
                }
            }
        }
        reaction
    }

    /// Close every pending action whose deadline has passed.
    ///
    /// Safety net for lost timers; normally there is nothing to do.
    pub fn sweep(&mut self, now: u64) -> Reaction {
        let mut reaction = Reaction::default();
        let mut due: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| {
                room.game
                    .as_ref()
                    .and_then(|g| g.state.pending())
                    .is_some_and(|p| p.is_expired(now))
            })
            .map(|room| room.id.clone())
            .collect();
        due.sort();

        if !due.is_empty() {
            tracing::debug!(target: "powderkeg::session", rooms = due.len(), "sweep closing expired windows");
        }
        for room_id in &due {
            self.progress(room_id, now, &mut reaction);
        }
        reaction
    }

    /// Public waiting rooms, without game state.
    #[must_use]
    pub fn public_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<&Room> = self
            .rooms
            .values()
            .filter(|room| room.is_public && room.status == RoomStatus::Waiting)
            .collect();
        rooms.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        rooms.into_iter().map(Room::summary).collect()
    }

    fn dispatch(&mut self, connection: ConnectionId, intent: ClientIntent, now: u64, reaction: &mut Reaction) -> Result<()> {
        match intent {
            ClientIntent::GetRooms => {
                reaction.send(connection, ServerEvent::RoomsList { rooms: self.public_rooms() });
                Ok(())
            }
            ClientIntent::JoinRoom { room_id, player_name } => {
                self.join(connection, room_id, player_name, now, reaction)
            }
            ClientIntent::LeaveRoom { room_id } => {
                self.leave(connection, &room_id, reaction)?;
                if let Some(slot) = self.connections.get_mut(&connection) {
                    *slot = None;
                }
                Ok(())
            }
            ClientIntent::ToggleReady { room_id } => self.toggle_ready(connection, &room_id, reaction),
            ClientIntent::StartGame { room_id } => self.start_game(connection, &room_id, now, reaction),
            intent => {
                let (Some(room_id), Some(action)) = (intent.room_id(), intent.action()) else {
                    return Ok(());
                };
                let room_id = room_id.clone();
                self.play(connection, &room_id, &action, now, reaction)
            }
        }
    }

    fn join(
        &mut self,
        connection: ConnectionId,
        room_id: RoomId,
        name: String,
        now: u64,
        reaction: &mut Reaction,
    ) -> Result<()> {
        let plan = match self.rooms.get(&room_id) {
            None => Seating::Create,
            Some(room) => {
                if let Some(seat) = room.member_by_connection(connection) {
                    Seating::Already(seat.id)
                } else if let Some(seat) = room.member_by_name(&name) {
                    Seating::Reconnect(seat.id)
                } else if room.status != RoomStatus::Waiting {
                    return Err(SessionError::GameInProgress);
                } else if room.is_full() {
                    return Err(SessionError::RoomFull);
                } else {
                    Seating::Add
                }
            }
        };

        if let Some(Some(current)) = self.connections.get(&connection).cloned() {
            if current != room_id {
                self.leave(connection, &current, reaction)?;
            }
        }

        let player_id = match (plan, self.rooms.get_mut(&room_id)) {
            (Seating::Already(id), _) => id,
            (Seating::Reconnect(id), Some(room)) => {
                let previous = room.member_mut(id).and_then(|seat| seat.connection.replace(connection));
                if let Some(previous) = previous.filter(|&previous| previous != connection) {
                    if let Some(slot) = self.connections.get_mut(&previous) {
                        *slot = None;
                    }
                }
                tracing::info!(target: "powderkeg::session", room = %room_id, player = %id, "player reconnected");
                id
            }
            (Seating::Add, Some(room)) => {
                let id = room.add_member(&name, connection);
                tracing::info!(target: "powderkeg::session", room = %room_id, player = %id, name = %name, "player joined");
                id
            }
            _ => {
                let room = Room::new(room_id.clone(), &name, connection, self.config.room_capacity, now);
                let host = room.host;
                self.rooms.insert(room_id.clone(), room);
                tracing::info!(target: "powderkeg::session", room = %room_id, host = %name, "room created");
                host
            }
        };

        self.connections.insert(connection, Some(room_id.clone()));
        reaction.disarm(&room_id, TimerKind::ReconnectGrace);
        reaction.send(
            connection,
            ServerEvent::Joined {
                room_id: room_id.clone(),
                player_id,
            },
        );
        self.broadcast_room(&room_id, reaction);

        let active_view = self
            .rooms
            .get(&room_id)
            .filter(|room| room.status == RoomStatus::Active)
            .and_then(|room| room.game.as_ref())
            .map(|game| GameView::for_viewer(&game.state, Some(player_id)));
        if let Some(game) = active_view {
            reaction.send(
                connection,
                ServerEvent::GameStarted {
                    room_id: room_id.clone(),
                    game,
                },
            );
            self.progress(&room_id, now, reaction);
        }

        self.broadcast_lobby(reaction);
        Ok(())
    }

    fn leave(&mut self, connection: ConnectionId, room_id: &RoomId, reaction: &mut Reaction) -> Result<()> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::RoomNotFound { room: room_id.clone() })?;
        let seat = room
            .member_by_connection(connection)
            .map(|p| p.id)
            .ok_or(SessionError::NotInRoom)?;

        if room.status == RoomStatus::Waiting {
            room.players.retain(|p| p.id != seat);
        } else if let Some(member) = room.member_mut(seat) {
            member.connection = None;
        }
        room.reassign_host();
        tracing::info!(target: "powderkeg::session", room = %room_id, player = %seat, "player left");

        let connected = room.connected_count();
        let status = room.status;
        if connected == 0 {
            if status == RoomStatus::Active {
                tracing::info!(target: "powderkeg::session", room = %room_id, "room empty, holding for reconnection");
                reaction.arm(room_id, TimerKind::ReconnectGrace, self.config.reconnect_grace);
            } else {
                self.destroy_room(room_id, reaction);
            }
        } else {
            self.broadcast_room(room_id, reaction);
        }
        self.broadcast_lobby(reaction);
        Ok(())
    }

    fn toggle_ready(&mut self, connection: ConnectionId, room_id: &RoomId, reaction: &mut Reaction) -> Result<()> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::RoomNotFound { room: room_id.clone() })?;
        let member = room
            .players
            .iter_mut()
            .find(|p| p.connection == Some(connection))
            .ok_or(SessionError::NotInRoom)?;
        member.is_ready = !member.is_ready;

        self.broadcast_room(room_id, reaction);
        self.broadcast_lobby(reaction);
        Ok(())
    }

    fn start_game(&mut self, connection: ConnectionId, room_id: &RoomId, now: u64, reaction: &mut Reaction) -> Result<()> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::RoomNotFound { room: room_id.clone() })?;
        let seat = room
            .member_by_connection(connection)
            .map(|p| p.id)
            .ok_or(SessionError::NotInRoom)?;
        if seat != room.host {
            return Err(SessionError::NotHost);
        }
        if room.status != RoomStatus::Waiting {
            return Err(SessionError::GameInProgress);
        }
        let min = self.config.game.min_players;
        if room.players.len() < min {
            return Err(SessionError::InsufficientPlayers { min });
        }
        if !room.all_ready() {
            return Err(SessionError::NotAllReady);
        }

        let rng = self.rng.fork();
        let seed = rng.seed();
        let mut engine = Engine::new(self.config.game.clone(), rng);
        let state = engine.new_game(&room.seats(), now)?;
        for (player, to) in room.connections() {
            reaction.send(
                to,
                ServerEvent::GameStarted {
                    room_id: room_id.clone(),
                    game: GameView::for_viewer(&state, Some(player)),
                },
            );
        }
        room.game = Some(ActiveGame { engine, state });
        room.status = RoomStatus::Active;
        room.elimination_armed = false;
        tracing::info!(target: "powderkeg::session", room = %room_id, players = room.players.len(), seed, "game started");

        self.broadcast_room(room_id, reaction);
        self.progress(room_id, now, reaction);
        self.broadcast_lobby(reaction);
        Ok(())
    }

    fn play(&mut self, connection: ConnectionId, room_id: &RoomId, action: &Action, now: u64, reaction: &mut Reaction) -> Result<()> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::RoomNotFound { room: room_id.clone() })?;
        let seat = room
            .member_by_connection(connection)
            .map(|p| p.id)
            .ok_or(SessionError::NotInRoom)?;
        let game = room.game.as_mut().ok_or(SessionError::GameNotStarted)?;

        game.state = game.engine.apply(&game.state, seat, action, now)?;
        tracing::debug!(
            target: "powderkeg::session",
            room = %room_id,
            player = %seat,
            action = action.name(),
            phase = ?game.state.turn_phase(),
            "action applied"
        );

        self.progress(room_id, now, reaction);
        Ok(())
    }

    /// Settle a room after its game changed.
    ///
    /// Closes anything already due, pushes redacted state to every
    /// connected member and arms the timers the new phase needs.
    fn progress(&mut self, room_id: &RoomId, now: u64, reaction: &mut Reaction) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(game) = room.game.as_mut() else {
            return;
        };
        while !game.state.is_finished() {
            let (next, outcome) = game.engine.expire(&game.state, now);
            if outcome == ExpiryOutcome::Idle {
                break;
            }
            game.state = next;
        }

        let Some(game) = room.game.as_ref() else {
            return;
        };
        let state = &game.state;
        for (player, to) in room.connections() {
            reaction.send(
                to,
                ServerEvent::GameStateUpdate {
                    room_id: room_id.clone(),
                    game: GameView::for_viewer(state, Some(player)),
                },
            );
        }
        let finished = state.is_finished().then_some(state.winner).flatten();
        let remaining = state.pending().map(|p| p.remaining_ms(now));
        let doomed = Engine::doomed_player(state);

        if let Some(winner) = finished {
            if room.status != RoomStatus::Finished {
                room.status = RoomStatus::Finished;
                room.elimination_armed = false;
                tracing::info!(target: "powderkeg::session", room = %room_id, %winner, "game finished");
                reaction.disarm(room_id, TimerKind::Window);
                reaction.disarm(room_id, TimerKind::Elimination);
                reaction.arm(room_id, TimerKind::FinishedTtl, self.config.finished_ttl);
                self.broadcast_room(room_id, reaction);
            }
            return;
        }

        match remaining {
            Some(ms) => reaction.arm(room_id, TimerKind::Window, Duration::from_millis(ms)),
            None => reaction.disarm(room_id, TimerKind::Window),
        }
        match doomed {
            Some(player) if !room.elimination_armed => {
                room.elimination_armed = true;
                tracing::debug!(target: "powderkeg::session", room = %room_id, %player, "no rescue, elimination pending");
                reaction.arm(room_id, TimerKind::Elimination, self.config.elimination_delay);
            }
            Some(_) => {}
            None if room.elimination_armed => {
                room.elimination_armed = false;
                reaction.disarm(room_id, TimerKind::Elimination);
            }
            None => {}
        }
    }

    fn destroy_room(&mut self, room_id: &RoomId, reaction: &mut Reaction) {
        let Some(room) = self.rooms.remove(room_id) else {
            return;
        };
        for (_, connection) in room.connections() {
            if let Some(slot) = self.connections.get_mut(&connection) {
                *slot = None;
            }
        }
        for kind in TimerKind::ALL {
            reaction.disarm(room_id, kind);
        }
        tracing::info!(target: "powderkeg::session", room = %room_id, "room closed");
        self.broadcast_lobby(reaction);
    }

    fn broadcast_room(&self, room_id: &RoomId, reaction: &mut Reaction) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let summary = room.summary();
        for (_, to) in room.connections() {
            reaction.send(to, ServerEvent::RoomSnapshot { room: summary.clone() });
        }
    }

    fn broadcast_lobby(&self, reaction: &mut Reaction) {
        let rooms = self.public_rooms();
        let mut connections: Vec<ConnectionId> = self.connections.keys().copied().collect();
        connections.sort_unstable();
        for to in connections {
            reaction.send(to, ServerEvent::RoomsList { rooms: rooms.clone() });
        }
    }
}
