//! Closing challenge windows and expiring the other pending phases.

use crate::cards::CardType;
use crate::core::{GameConfig, GameRng, GameState, Phase, PlayerId, TurnPhase};
use crate::rules::turns;

use super::{DeferredEffect, PendingAction};

/// What closing a challenge window did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowOutcome {
    /// No window was open. Nothing changed.
    NotOpen,
    /// Odd cancel count. The effect was dropped.
    Cancelled,
    /// Even cancel count. The effect was applied.
    Resolved,
}

/// What expiring the pending phase did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// Nothing pending, or the deadline has not passed.
    Idle,
    /// The pending phase was closed with its timeout behaviour.
    Expired(TurnPhase),
}

/// Close the open challenge window by cancel parity.
///
/// Does not look at the clock: the caller decides the window is over.
/// Calling it again after the window closed is a no-op.
pub fn resolve_window(
    state: &mut GameState,
    rng: &mut GameRng,
    config: &GameConfig,
    now: u64,
) -> WindowOutcome {
    if !matches!(state.phase, Phase::ChallengeWindow { .. }) {
        return WindowOutcome::NotOpen;
    }
    let Phase::ChallengeWindow { pending, effect } = std::mem::replace(&mut state.phase, Phase::Playing)
    else {
        unreachable!("phase checked above");
    };

    if pending.is_cancelled() {
        tracing::debug!(
            target: "powderkeg::rules",
            actor = %pending.initiator,
            cancels = pending.cancels.len(),
            "effect cancelled"
        );
        return WindowOutcome::Cancelled;
    }

    tracing::debug!(
        target: "powderkeg::rules",
        actor = %pending.initiator,
        card = %effect.card_type(),
        cancels = pending.cancels.len(),
        "effect resolved"
    );
    apply_effect(state, effect, rng, config, now);
    WindowOutcome::Resolved
}

/// Close whatever pending phase has passed its deadline.
///
/// Idempotent: before the deadline, or with nothing pending, the state is
/// left alone.
pub fn expire_pending(
    state: &mut GameState,
    rng: &mut GameRng,
    config: &GameConfig,
    now: u64,
) -> ExpiryOutcome {
    let Some(pending) = state.pending() else {
        return ExpiryOutcome::Idle;
    };
    if !pending.is_expired(now) {
        return ExpiryOutcome::Idle;
    }
    let kind = state.turn_phase();

    match std::mem::replace(&mut state.phase, Phase::Playing) {
        Phase::ChallengeWindow { pending, effect } => {
            state.phase = Phase::ChallengeWindow { pending, effect };
            resolve_window(state, rng, config, now);
        }
        Phase::PlacingBomb { bomb, .. } => {
            let position = rng.gen_range_usize(0..state.draw_pile.len() + 1);
            turns::insert_into_draw_pile(state, bomb, position);
            turns::consume_turn(state);
        }
        Phase::AwaitingGift { pending, giver } => {
            give_random_card(state, rng, giver, pending.initiator);
        }
        Phase::AwaitingPeek { .. } | Phase::AwaitingReorder { .. } | Phase::AwaitingBury { .. } => {}
        Phase::Playing | Phase::Exploded => unreachable!("phase has a pending action"),
    }

    tracing::debug!(target: "powderkeg::rules", phase = ?kind, "pending action expired");
    ExpiryOutcome::Expired(kind)
}

fn apply_effect(
    state: &mut GameState,
    effect: DeferredEffect,
    rng: &mut GameRng,
    config: &GameConfig,
    now: u64,
) {
    match effect {
        DeferredEffect::ExtraTurn { actor } => {
            if let Some(p) = state.player_mut(actor) {
                p.turns_remaining = 0;
            }
            let next = turns::next_living_index(
                &state.players,
                state.current_player_index,
                state.direction,
            );
            state.players[next].turns_remaining += 2;
            turns::end_turn(state);
        }
        DeferredEffect::EndTurn { .. } => {
            turns::consume_turn(state);
        }
        DeferredEffect::Reshuffle { .. } => {
            rng.shuffle_vector(&mut state.draw_pile);
        }
        DeferredEffect::Peek { actor } => {
            let pending = PendingAction::starting(
                actor,
                Some(CardType::Peek),
                now,
                config.peek_display_ms,
            );
            state.phase = Phase::AwaitingPeek { pending };
        }
        DeferredEffect::RequestGift { actor, target } => {
            let has_cards = state
                .player(target)
                .is_some_and(|p| p.is_alive && !p.hand.is_empty());
            if has_cards {
                let pending = PendingAction::starting(
                    actor,
                    Some(CardType::Gift),
                    now,
                    config.response_ms,
                )
                .with_target(Some(target));
                state.phase = Phase::AwaitingGift { pending, giver: target };
            }
        }
        DeferredEffect::StealRandom { actor, target, .. } => {
            give_random_card(state, rng, target, actor);
        }
        DeferredEffect::StealChosen { actor, target, chosen, .. } => {
            let stolen = state.player_mut(target).and_then(|p| p.take_type(chosen));
            if let (Some(card), Some(thief)) = (stolen, state.player_mut(actor)) {
                thief.hand.push(card);
            }
        }
        DeferredEffect::ReverseDirection { .. } => {
            state.direction = state.direction.reversed();
        }
        DeferredEffect::DrawFromBottom { .. } => {
            if let Some(card) = state.draw_pile.pop_back() {
                turns::receive_draw(state, card);
            }
        }
        DeferredEffect::RevealAndReorder { actor } => {
            let pending = PendingAction::starting(
                actor,
                Some(CardType::Reorder),
                now,
                config.response_ms,
            );
            state.phase = Phase::AwaitingReorder { pending };
        }
        DeferredEffect::Bury { actor } => {
            let has_cards = state.player(actor).is_some_and(|p| !p.hand.is_empty());
            if has_cards {
                let pending = PendingAction::starting(
                    actor,
                    Some(CardType::Bury),
                    now,
                    config.response_ms,
                );
                state.phase = Phase::AwaitingBury { pending };
            }
        }
    }
}

/// Move a uniformly random card from `from`'s hand to `to`'s hand.
fn give_random_card(
    state: &mut GameState,
    rng: &mut GameRng,
    from: PlayerId,
    to: PlayerId,
) {
    let card = state.player_mut(from).and_then(|p| {
        let idx = rng.choose_index(p.hand.len())?;
        Some(p.hand.remove(idx))
    });
    if let (Some(card), Some(receiver)) = (card, state.player_mut(to)) {
        receiver.hand.push(card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, CardId};
    use crate::core::{GameStatus, Player, TurnDirection};
    use crate::window::open_window;
    use im::Vector;

    fn card(id: u32, card_type: CardType) -> Card {
        Card::new(CardId::new(id), card_type)
    }

    fn state() -> GameState {
        let mut a = Player::new(PlayerId::new(0), "a");
        a.is_current_turn = true;
        a.turns_remaining = 1;
        a.hand = vec![card(0, CardType::Rescue), card(1, CardType::Taco)];
        let mut b = Player::new(PlayerId::new(1), "b");
        b.hand = vec![card(2, CardType::Rescue), card(3, CardType::Melon)];
        let c = Player::new(PlayerId::new(2), "c");

        GameState {
            players: vec![a, b, c],
            draw_pile: (10..16).map(|i| card(i, CardType::Cancel)).collect(),
            discard_pile: Vector::new(),
            current_player_index: 0,
            phase: Phase::Playing,
            status: GameStatus::Active,
            direction: TurnDirection::Clockwise,
            winner: None,
            created_at: 0,
        }
    }

    fn open(state: &mut GameState, effect: DeferredEffect) {
        open_window(state, effect, &GameConfig::default(), 0);
    }

    #[test]
    fn test_resolve_without_window_is_noop() {
        let mut s = state();
        let before = s.clone();

        let outcome = resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 0);

        assert_eq!(outcome, WindowOutcome::NotOpen);
        assert_eq!(s, before);
    }

    #[test]
    fn test_odd_cancels_drop_effect() {
        let mut s = state();
        open(&mut s, DeferredEffect::ReverseDirection { actor: PlayerId::new(0) });
        if let Phase::ChallengeWindow { pending, .. } = &mut s.phase {
            pending.cancels.push(PlayerId::new(1));
        }

        let outcome = resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 10);

        assert_eq!(outcome, WindowOutcome::Cancelled);
        assert_eq!(s.direction, TurnDirection::Clockwise);
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn test_resolve_twice_equals_once() {
        let mut s = state();
        open(&mut s, DeferredEffect::Reshuffle { actor: PlayerId::new(0) });
        let mut rng = GameRng::new(7);
        let config = GameConfig::default();

        resolve_window(&mut s, &mut rng, &config, 3_000);
        let once = s.clone();
        let second = resolve_window(&mut s, &mut rng, &config, 3_001);

        assert_eq!(second, WindowOutcome::NotOpen);
        assert_eq!(s, once);
    }

    #[test]
    fn test_extra_turn_stacks_on_next_player() {
        let mut s = state();
        s.players[1].turns_remaining = 0;
        open(&mut s, DeferredEffect::ExtraTurn { actor: PlayerId::new(0) });

        resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 3_000);

        assert_eq!(s.current_player_index, 1);
        assert_eq!(s.players[0].turns_remaining, 0);
        assert_eq!(s.players[1].turns_remaining, 2);
        s.assert_consistent();
    }

    #[test]
    fn test_steal_chosen_missing_type_is_noop() {
        let mut s = state();
        open(
            &mut s,
            DeferredEffect::StealChosen {
                actor: PlayerId::new(0),
                target: PlayerId::new(1),
                cards: smallvec::smallvec![],
                chosen: CardType::Peek,
                set_type: CardType::Taco,
            },
        );

        resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 3_000);

        assert_eq!(s.players[0].hand_size(), 2);
        assert_eq!(s.players[1].hand_size(), 2);
    }

    #[test]
    fn test_steal_chosen_takes_named_type() {
        let mut s = state();
        open(
            &mut s,
            DeferredEffect::StealChosen {
                actor: PlayerId::new(0),
                target: PlayerId::new(1),
                cards: smallvec::smallvec![],
                chosen: CardType::Melon,
                set_type: CardType::Taco,
            },
        );

        resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 3_000);

        assert!(s.players[0].holds(CardId::new(3)));
        assert!(!s.players[1].holds_type(CardType::Melon));
    }

    #[test]
    fn test_gift_to_empty_hand_resolves_to_nothing() {
        let mut s = state();
        open(
            &mut s,
            DeferredEffect::RequestGift { actor: PlayerId::new(0), target: PlayerId::new(2) },
        );

        resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 3_000);

        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn test_draw_from_bottom() {
        let mut s = state();
        let bottom = *s.draw_pile.back().unwrap();
        open(&mut s, DeferredEffect::DrawFromBottom { actor: PlayerId::new(0) });

        resolve_window(&mut s, &mut GameRng::new(1), &GameConfig::default(), 3_000);

        assert!(s.players[0].holds(bottom.id));
        assert_eq!(s.current_player_index, 1);
        assert_eq!(s.draw_pile.len(), 5);
    }

    #[test]
    fn test_expire_before_deadline_is_idle() {
        let mut s = state();
        open(&mut s, DeferredEffect::Peek { actor: PlayerId::new(0) });
        let before = s.clone();

        let outcome = expire_pending(&mut s, &mut GameRng::new(1), &GameConfig::default(), 2_999);

        assert_eq!(outcome, ExpiryOutcome::Idle);
        assert_eq!(s, before);
    }

    #[test]
    fn test_expire_window_then_peek() {
        let mut s = state();
        let config = GameConfig::default();
        let mut rng = GameRng::new(1);
        open(&mut s, DeferredEffect::Peek { actor: PlayerId::new(0) });

        let first = expire_pending(&mut s, &mut rng, &config, 3_000);
        assert_eq!(first, ExpiryOutcome::Expired(TurnPhase::ChallengeWindow));
        assert_eq!(s.turn_phase(), TurnPhase::AwaitingPeekResponse);
        assert_eq!(s.pending().map(|p| p.expires_at), Some(3_000 + config.peek_display_ms));

        let second = expire_pending(&mut s, &mut rng, &config, 3_000 + config.peek_display_ms);
        assert_eq!(second, ExpiryOutcome::Expired(TurnPhase::AwaitingPeekResponse));
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn test_expired_bomb_placement_inserts_and_passes_turn() {
        let mut s = state();
        let bomb = card(99, CardType::Bomb);
        s.phase = Phase::PlacingBomb {
            pending: PendingAction::new(PlayerId::new(0), Some(CardType::Rescue), 0, 100),
            bomb,
        };

        expire_pending(&mut s, &mut GameRng::new(3), &GameConfig::default(), 100);

        assert_eq!(s.draw_pile.len(), 7);
        assert!(s.draw_pile.contains(&bomb));
        assert_eq!(s.current_player_index, 1);
        s.assert_consistent();
    }

    #[test]
    fn test_expired_gift_takes_random_card() {
        let mut s = state();
        s.phase = Phase::AwaitingGift {
            pending: PendingAction::new(PlayerId::new(0), Some(CardType::Gift), 0, 100)
                .with_target(Some(PlayerId::new(1))),
            giver: PlayerId::new(1),
        };

        expire_pending(&mut s, &mut GameRng::new(3), &GameConfig::default(), 100);

        assert_eq!(s.players[0].hand_size(), 3);
        assert_eq!(s.players[1].hand_size(), 1);
        assert_eq!(s.phase, Phase::Playing);
    }
}
