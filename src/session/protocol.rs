//! Wire protocol between clients and the lobby.
//!
//! JSON messages tagged by `"type"` with kebab-case names and camelCase
//! fields. The acting player is never taken from the message: it is the
//! seat bound to the sending connection.
//!
//! ```
//! use powderkeg::session::ClientIntent;
//!
//! let intent: ClientIntent =
//!     serde_json::from_str(r#"{"type":"join-room","roomId":"den","playerName":"ada"}"#).unwrap();
//! assert!(matches!(intent, ClientIntent::JoinRoom { .. }));
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::room::{RoomId, RoomSummary};
use super::view::GameView;
use crate::cards::{CardId, CardType};
use crate::core::{Action, PlayerId};

/// Inbound message from a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    JoinRoom { room_id: RoomId, player_name: String },
    LeaveRoom { room_id: RoomId },
    ToggleReady { room_id: RoomId },
    StartGame { room_id: RoomId },
    DrawCard { room_id: RoomId },
    PlayCard {
        room_id: RoomId,
        card_id: CardId,
        #[serde(default)]
        target_id: Option<PlayerId>,
    },
    PlayMatchingSet {
        room_id: RoomId,
        card_ids: SmallVec<[CardId; 3]>,
        target_id: PlayerId,
        #[serde(default)]
        chosen_type: Option<CardType>,
    },
    PlaceBomb { room_id: RoomId, position: usize },
    RespondToGift { room_id: RoomId, card_id: CardId },
    ReorderResponse { room_id: RoomId, card_order: SmallVec<[CardId; 3]> },
    BuryResponse { room_id: RoomId, card_id: CardId, position: usize },
    GetRooms,
}

impl ClientIntent {
    /// Room the intent is addressed to.
    #[must_use]
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            ClientIntent::JoinRoom { room_id, .. }
            | ClientIntent::LeaveRoom { room_id }
            | ClientIntent::ToggleReady { room_id }
            | ClientIntent::StartGame { room_id }
            | ClientIntent::DrawCard { room_id }
            | ClientIntent::PlayCard { room_id, .. }
            | ClientIntent::PlayMatchingSet { room_id, .. }
            | ClientIntent::PlaceBomb { room_id, .. }
            | ClientIntent::RespondToGift { room_id, .. }
            | ClientIntent::ReorderResponse { room_id, .. }
            | ClientIntent::BuryResponse { room_id, .. } => Some(room_id),
            ClientIntent::GetRooms => None,
        }
    }

    /// Game action carried by the intent, if it is one.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        let action = match self {
            ClientIntent::DrawCard { .. } => Action::Draw,
            ClientIntent::PlayCard { card_id, target_id, .. } => Action::PlayCard {
                card: *card_id,
                target: *target_id,
            },
            ClientIntent::PlayMatchingSet {
                card_ids,
                target_id,
                chosen_type,
                ..
            } => Action::PlayMatchingSet {
                cards: card_ids.clone(),
                target: *target_id,
                chosen_type: *chosen_type,
            },
            ClientIntent::PlaceBomb { position, .. } => Action::PlaceBomb { position: *position },
            ClientIntent::RespondToGift { card_id, .. } => Action::RespondToGift { card: *card_id },
            ClientIntent::ReorderResponse { card_order, .. } => Action::Reorder {
                order: card_order.clone(),
            },
            ClientIntent::BuryResponse { card_id, position, .. } => Action::Bury {
                card: *card_id,
                position: *position,
            },
            _ => return None,
        };
        Some(action)
    }
}

/// Outbound message to a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Seat assigned to this connection.
    Joined { room_id: RoomId, player_id: PlayerId },
    RoomSnapshot { room: RoomSummary },
    GameStarted { room_id: RoomId, game: GameView },
    GameStateUpdate { room_id: RoomId, game: GameView },
    RoomsList { rooms: Vec<RoomSummary> },
    PlayerDisconnected { room_id: RoomId, player_name: String },
    Error { message: String },
}

impl ServerEvent {
    #[must_use]
    pub fn error(message: impl ToString) -> Self {
        ServerEvent::Error {
            message: message.to_string(),
        }
    }
}
