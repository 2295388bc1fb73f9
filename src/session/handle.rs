//! Client-facing handle to the lobby worker.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::config::SessionConfig;
use super::error::{Result, SessionError};
use super::orchestrator::Orchestrator;
use super::protocol::{ClientIntent, ServerEvent};
use super::room::{ConnectionId, RoomId};
use super::worker::{Command, LobbyWorker, RoomInspection};

/// Cloneable handle to a running lobby.
///
/// The worker stops once every handle is dropped.
#[derive(Clone, Debug)]
pub struct LobbyHandle {
    commands: mpsc::Sender<Command>,
}

impl LobbyHandle {
    /// Spawn a lobby worker on the current tokio runtime.
    pub fn spawn(config: SessionConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(config.command_buffer);
        let worker = LobbyWorker::new(Orchestrator::new(config), receiver, commands.downgrade());
        let task = tokio::spawn(worker.run());
        tracing::info!(target: "powderkeg::session", "lobby worker started");
        (Self { commands }, task)
    }

    /// Open a connection. Events for it arrive on the returned receiver.
    pub async fn connect(&self) -> Result<(ConnectionId, mpsc::UnboundedReceiver<ServerEvent>)> {
        let (outbox, events) = mpsc::unbounded_channel();
        let (reply, response) = oneshot::channel();
        self.dispatch(Command::Connect { outbox, reply }).await?;
        let connection = response.await.map_err(SessionError::ReplyChannelClosed)?;
        Ok((connection, events))
    }

    /// Submit an intent on behalf of a connection.
    pub async fn send(&self, connection: ConnectionId, intent: ClientIntent) -> Result<()> {
        self.dispatch(Command::Intent { connection, intent }).await
    }

    /// Send an event to a connection without touching any room.
    pub async fn notify(&self, connection: ConnectionId, event: ServerEvent) -> Result<()> {
        self.dispatch(Command::Notify { connection, event }).await
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<()> {
        self.dispatch(Command::Disconnect { connection }).await
    }

    /// Unredacted view of a room.
    pub async fn inspect(&self, room: RoomId) -> Result<Option<RoomInspection>> {
        let (reply, response) = oneshot::channel();
        self.dispatch(Command::Inspect { room, reply }).await?;
        response.await.map_err(SessionError::ReplyChannelClosed)
    }

    async fn dispatch(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::CommandChannelClosed)
    }
}
