//! Per-viewer redaction of game state.
//!
//! A viewer sees their own hand, a card count for everyone else, and only
//! the size of the draw pile. The initiator of an active peek or reorder
//! additionally sees the top cards.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::core::{GameState, GameStatus, Phase, PlayerId, TurnDirection, TurnPhase};
use crate::window::PendingAction;

/// Cards revealed to peek and reorder initiators.
pub const REVEALED_CARDS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// Present for the viewer's own seat only.
    pub hand: Option<Vec<Card>>,
    pub hand_count: usize,
    pub is_alive: bool,
    pub turns_remaining: u32,
    pub is_current_turn: bool,
}

/// Game state as one subscriber may see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub players: Vec<PlayerView>,
    pub draw_pile_count: usize,
    /// Top of the draw pile, for an authorized viewer.
    pub revealed: Option<Vec<Card>>,
    pub discard_pile: Vector<Card>,
    pub current_player_index: usize,
    pub turn_phase: TurnPhase,
    pub pending_action: Option<PendingAction>,
    pub status: GameStatus,
    pub direction: TurnDirection,
    pub winner: Option<PlayerId>,
    pub created_at: u64,
}

impl GameView {
    /// Redact `state` for `viewer`. `None` is a spectator.
    #[must_use]
    pub fn for_viewer(state: &GameState, viewer: Option<PlayerId>) -> Self {
        let players = state
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                hand: (Some(p.id) == viewer).then(|| p.hand.clone()),
                hand_count: p.hand.len(),
                is_alive: p.is_alive,
                turns_remaining: p.turns_remaining,
                is_current_turn: p.is_current_turn,
            })
            .collect();

        let revealed = match &state.phase {
            Phase::AwaitingPeek { pending } | Phase::AwaitingReorder { pending }
                if Some(pending.initiator) == viewer =>
            {
                Some(state.top_cards(REVEALED_CARDS))
            }
            _ => None,
        };

        Self {
            players,
            draw_pile_count: state.draw_pile.len(),
            revealed,
            discard_pile: state.discard_pile.clone(),
            current_player_index: state.current_player_index,
            turn_phase: state.turn_phase(),
            pending_action: state.pending().cloned(),
            status: state.status,
            direction: state.direction,
            winner: state.winner,
            created_at: state.created_at,
        }
    }

    /// The viewer's own seat, if they have one.
    #[must_use]
    pub fn own(&self) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.hand.is_some())
    }
}
