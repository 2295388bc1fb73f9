//! Challenge windows and other pending actions.
//!
//! An action card never takes effect when played. Its effect is staged as
//! a [`DeferredEffect`] inside a challenge window that stays open for a
//! fixed real-time budget. Any player holding a cancel card may play it
//! while the window is open; each cancel play is recorded, not applied.
//!
//! ## Resolution
//!
//! When the window closes the parity of the cancel list decides:
//! - **odd** count: the effect is discarded (the card that staged it is
//!   already in the discard pile, no refund)
//! - **even** count, zero included: the effect resolves
//!
//! The window is plain data (a [`PendingAction`] with an expiry), so
//! resolving it is a pure, idempotent function of the snapshot: once it
//! has resolved the phase no longer holds a window and a second call does
//! nothing. A scheduled timer and a periodic sweep can both call it.
//!
//! Cancel plays do not extend the expiry.

mod effect;
mod resolve;

pub use effect::DeferredEffect;
pub use resolve::{expire_pending, resolve_window, ExpiryOutcome, WindowOutcome};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::CardType;
use crate::core::{GameConfig, GameState, Phase, PlayerId};

/// Asynchronous effect in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub initiator: PlayerId,
    pub target: Option<PlayerId>,

    /// Card type being resolved, for display.
    pub card_type: Option<CardType>,

    /// Players who played a cancel card against this action, in order.
    pub cancels: SmallVec<[PlayerId; 4]>,

    pub created_at: u64,
    pub expires_at: u64,
}

impl PendingAction {
    #[must_use]
    pub fn new(initiator: PlayerId, card_type: Option<CardType>, created_at: u64, expires_at: u64) -> Self {
        Self {
            initiator,
            target: None,
            card_type,
            cancels: SmallVec::new(),
            created_at,
            expires_at,
        }
    }

    /// Pending action that expires `budget_ms` after `now`.
    #[must_use]
    pub fn starting(initiator: PlayerId, card_type: Option<CardType>, now: u64, budget_ms: u64) -> Self {
        Self::new(initiator, card_type, now, now.saturating_add(budget_ms))
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<PlayerId>) -> Self {
        self.target = target;
        self
    }

    /// Expired at or after the deadline. Ties go to the timer.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// Odd number of cancel plays.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancels.len() % 2 == 1
    }
}

/// Stage `effect` in a new challenge window opened by `actor`.
pub fn open_window(state: &mut GameState, effect: DeferredEffect, config: &GameConfig, now: u64) {
    let pending = PendingAction::starting(
        effect.actor(),
        Some(effect.card_type()),
        now,
        config.challenge_window_ms,
    )
    .with_target(effect.target());

    tracing::debug!(
        target: "powderkeg::rules",
        actor = %effect.actor(),
        card = %effect.card_type(),
        expires_at = pending.expires_at,
        "challenge window opened"
    );

    state.phase = Phase::ChallengeWindow { pending, effect };
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_cancel_parity() {
        let mut pending = PendingAction::new(PlayerId::new(0), Some(CardType::Reshuffle), 0, 3_000);

        assert!(!pending.is_cancelled());
        for k in 1..=4u32 {
            pending.cancels.push(PlayerId::new(k % 2));
            assert_eq!(pending.is_cancelled(), k % 2 == 1);
        }
    }

    #[test]
    fn test_expiry_tie_goes_to_timer() {
        let pending = PendingAction::starting(PlayerId::new(0), None, 1_000, 3_000);

        assert_eq!(pending.expires_at, 4_000);
        assert!(!pending.is_expired(3_999));
        assert!(pending.is_expired(4_000));
        assert_eq!(pending.remaining_ms(3_500), 500);
        assert_eq!(pending.remaining_ms(9_000), 0);
    }

    #[test]
    fn test_pending_wire_format() {
        let mut pending = PendingAction::new(PlayerId::new(2), Some(CardType::Gift), 1, 2)
            .with_target(Some(PlayerId::new(3)));
        pending.cancels = smallvec![PlayerId::new(3)];

        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["initiator"], 2);
        assert_eq!(json["cardType"], "gift");
        assert_eq!(json["cancels"], serde_json::json!([3]));
    }
}
