//! Game state: the authoritative per-room snapshot.
//!
//! ## Phase
//!
//! The turn phase and the pending action are one value. `Phase` variants
//! that wait on something carry their [`PendingAction`] (and whatever else
//! that wait needs, e.g. the held bomb), so a pending action exists exactly
//! when the phase is one of the waiting phases. [`TurnPhase`] is the
//! field-less tag for display and checks.
//!
//! ## GameState
//!
//! Cloned for every transition. Piles use `im` persistent vectors so a
//! clone shares structure with its predecessor.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerId};
use crate::cards::{Card, CardType};
use crate::window::{DeferredEffect, PendingAction};

/// Field-less turn phase tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    Playing,
    Exploded,
    PlacingBomb,
    ChallengeWindow,
    AwaitingGift,
    AwaitingPeekResponse,
    AwaitingReorder,
    AwaitingBury,
}

/// Turn phase together with whatever the phase is waiting on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Phase {
    /// Current player may play effect cards, then must draw.
    Playing,
    /// Current player drew a bomb and must play a rescue card.
    Exploded,
    /// Rescued player chooses where the bomb goes back.
    PlacingBomb { pending: PendingAction, bomb: Card },
    /// A staged effect is open to cancel plays.
    ChallengeWindow { pending: PendingAction, effect: DeferredEffect },
    /// `giver` must hand the initiator a card.
    AwaitingGift { pending: PendingAction, giver: PlayerId },
    /// Top cards are on display to the initiator. Play continues.
    AwaitingPeek { pending: PendingAction },
    /// Initiator may reorder the top cards.
    AwaitingReorder { pending: PendingAction },
    /// Initiator may bury a card from hand.
    AwaitingBury { pending: PendingAction },
}

impl Phase {
    #[must_use]
    pub fn kind(&self) -> TurnPhase {
        match self {
            Phase::Playing => TurnPhase::Playing,
            Phase::Exploded => TurnPhase::Exploded,
            Phase::PlacingBomb { .. } => TurnPhase::PlacingBomb,
            Phase::ChallengeWindow { .. } => TurnPhase::ChallengeWindow,
            Phase::AwaitingGift { .. } => TurnPhase::AwaitingGift,
            Phase::AwaitingPeek { .. } => TurnPhase::AwaitingPeekResponse,
            Phase::AwaitingReorder { .. } => TurnPhase::AwaitingReorder,
            Phase::AwaitingBury { .. } => TurnPhase::AwaitingBury,
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        match self {
            Phase::Playing | Phase::Exploded => None,
            Phase::PlacingBomb { pending, .. }
            | Phase::ChallengeWindow { pending, .. }
            | Phase::AwaitingGift { pending, .. }
            | Phase::AwaitingPeek { pending }
            | Phase::AwaitingReorder { pending }
            | Phase::AwaitingBury { pending } => Some(pending),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    Active,
    Finished,
}

/// Direction play passes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnDirection {
    Clockwise,
    CounterClockwise,
}

impl TurnDirection {
    /// +1 or -1.
    #[must_use]
    pub const fn step(self) -> isize {
        match self {
            TurnDirection::Clockwise => 1,
            TurnDirection::CounterClockwise => -1,
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            TurnDirection::Clockwise => TurnDirection::CounterClockwise,
            TurnDirection::CounterClockwise => TurnDirection::Clockwise,
        }
    }
}

/// Authoritative snapshot of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: Vec<Player>,

    /// Front = next card drawn.
    pub draw_pile: Vector<Card>,

    /// Append-only. Back = most recent.
    pub discard_pile: Vector<Card>,

    pub current_player_index: usize,
    pub phase: Phase,
    pub status: GameStatus,
    pub direction: TurnDirection,
    pub winner: Option<PlayerId>,

    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl GameState {
    /// Tag of the current phase.
    #[must_use]
    pub fn turn_phase(&self) -> TurnPhase {
        self.phase.kind()
    }

    /// Pending action of the current phase, if it waits on one.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.phase.pending()
    }

    /// Bomb held between a rescue and its placement.
    #[must_use]
    pub fn held_card(&self) -> Option<&Card> {
        match &self.phase {
            Phase::PlacingBomb { bomb, .. } => Some(bomb),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    #[must_use]
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    pub fn current_player_mut(&mut self) -> &mut Player {
        &mut self.players[self.current_player_index]
    }

    #[must_use]
    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Iterate over living players in seat order.
    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive)
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.living_players().count()
    }

    /// Up to `count` cards from the front of the draw pile.
    #[must_use]
    pub fn top_cards(&self, count: usize) -> Vec<Card> {
        self.draw_pile.iter().take(count).copied().collect()
    }

    /// Count cards of a type everywhere: hands, piles and the held bomb.
    #[must_use]
    pub fn count_everywhere(&self, card_type: CardType) -> usize {
        self.all_cards().filter(|c| c.card_type == card_type).count()
    }

    /// Every card currently in play.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.players
            .iter()
            .flat_map(|p| p.hand.iter())
            .chain(self.draw_pile.iter())
            .chain(self.discard_pile.iter())
            .chain(self.held_card())
    }

    /// Assert the structural invariants of an active game.
    ///
    /// A failure here is a bug in the rule engine, not a player error.
    pub fn assert_consistent(&self) {
        if self.is_finished() {
            assert!(self.winner.is_some(), "finished game without a winner");
            return;
        }
        let current: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_current_turn)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(current, vec![self.current_player_index], "exactly one current player");
        assert!(self.current_player().is_alive, "current player must be alive");
        assert!(self.alive_count() >= 2, "active game needs two living players");

        let mut ids: Vec<_> = self.all_cards().map(|c| c.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "card duplicated");
    }
}
