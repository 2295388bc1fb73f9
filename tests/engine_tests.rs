//! Rule engine integration tests.
//!
//! These tests drive full turns through `Engine` on hand-built tables so
//! every card position is known in advance.

use im::Vector;
use powderkeg::cards::{Card, CardId, CardType};
use powderkeg::core::{
    Action, GameConfig, GameState, GameStatus, Phase, Player, PlayerId, RuleError, TurnDirection,
    TurnPhase,
};
use powderkeg::rules::Engine;
use powderkeg::window::WindowOutcome;

const WINDOW_MS: u64 = 3_000;

fn card(id: u32, card_type: CardType) -> Card {
    Card::new(CardId::new(id), card_type)
}

fn pid(id: u32) -> PlayerId {
    PlayerId::new(id)
}

/// `n` living players, each holding one rescue card, with `pile` as the
/// draw pile and seat 0 to act.
fn table(n: u32, pile: Vec<Card>) -> GameState {
    let players = (0..n)
        .map(|i| {
            let mut p = Player::new(pid(i), format!("p{i}"));
            p.hand.push(card(100 + i, CardType::Rescue));
            if i == 0 {
                p.is_current_turn = true;
                p.turns_remaining = 1;
            }
            p
        })
        .collect();

    GameState {
        players,
        draw_pile: pile.into_iter().collect(),
        discard_pile: Vector::new(),
        current_player_index: 0,
        phase: Phase::Playing,
        status: GameStatus::Active,
        direction: TurnDirection::Clockwise,
        winner: None,
        created_at: 0,
    }
}

/// Draw pile of harmless collectibles with ids `0..len`.
fn safe_pile(len: u32) -> Vec<Card> {
    (0..len).map(|i| card(i, CardType::Potato)).collect()
}

fn engine() -> Engine {
    Engine::with_seed(GameConfig::default().with_challenge_window_ms(WINDOW_MS), 42)
}

fn give(state: &mut GameState, player: u32, id: u32, card_type: CardType) -> CardId {
    let card = card(id, card_type);
    state.players[player as usize].hand.push(card);
    card.id
}

// =============================================================================
// Challenge Window Tests
// =============================================================================

/// Cancel parity decides the outcome for every chain length.
#[test]
fn test_cancel_parity_end_to_end() {
    for k in 0..=4u32 {
        let mut e = engine();
        let mut state = table(5, safe_pile(10));
        let reverse = give(&mut state, 0, 500, CardType::Reverse);
        let cancels: Vec<CardId> = (1..=4).map(|p| give(&mut state, p, 600 + p, CardType::Cancel)).collect();

        state = e
            .apply(&state, pid(0), &Action::play(reverse), 0)
            .unwrap();
        assert_eq!(state.turn_phase(), TurnPhase::ChallengeWindow);

        for i in 0..k {
            let canceller = i + 1;
            state = e
                .apply(&state, pid(canceller), &Action::play(cancels[i as usize]), 100 + u64::from(i))
                .unwrap();
        }
        assert_eq!(state.pending().map(|p| p.cancels.len()), Some(k as usize));

        let (state, outcome) = e.resolve_window(&state, WINDOW_MS);
        let expected_direction = if k % 2 == 0 {
            assert_eq!(outcome, WindowOutcome::Resolved, "k = {k}");
            TurnDirection::CounterClockwise
        } else {
            assert_eq!(outcome, WindowOutcome::Cancelled, "k = {k}");
            TurnDirection::Clockwise
        };
        assert_eq!(state.direction, expected_direction, "k = {k}");
        assert_eq!(state.turn_phase(), TurnPhase::Playing);
        assert_eq!(state.discard_pile.len(), 1 + k as usize);
    }
}

/// A cancel after the deadline is rejected and not recorded.
#[test]
fn test_late_cancel_rejected() {
    let mut e = engine();
    let mut state = table(2, safe_pile(5));
    let reverse = give(&mut state, 0, 500, CardType::Reverse);
    let cancel = give(&mut state, 1, 501, CardType::Cancel);

    let state = e.apply(&state, pid(0), &Action::play(reverse), 0).unwrap();
    let err = e.apply(&state, pid(1), &Action::play(cancel), WINDOW_MS).unwrap_err();

    assert_eq!(err, RuleError::WindowExpired);
    assert!(state.players[1].holds(cancel));
}

/// Resolving an already-resolved window changes nothing.
#[test]
fn test_resolve_is_idempotent() {
    let mut e = engine();
    let mut state = table(3, safe_pile(5));
    let reverse = give(&mut state, 0, 500, CardType::Reverse);
    let state = e.apply(&state, pid(0), &Action::play(reverse), 0).unwrap();

    let (first, outcome) = e.resolve_window(&state, WINDOW_MS);
    assert_eq!(outcome, WindowOutcome::Resolved);

    let (second, outcome) = e.resolve_window(&first, WINDOW_MS + 1);
    assert_eq!(outcome, WindowOutcome::NotOpen);
    assert_eq!(second, first);

    let (third, _) = e.expire(&first, WINDOW_MS * 10);
    assert_eq!(third, first);
}

/// Extra turn hands the next player two owed turns.
#[test]
fn test_extra_turn_stacks_two() {
    let mut e = engine();
    let mut state = table(3, safe_pile(10));
    let extra = give(&mut state, 0, 500, CardType::ExtraTurn);

    let state = e.apply(&state, pid(0), &Action::play(extra), 0).unwrap();
    let (state, _) = e.resolve_window(&state, WINDOW_MS);

    assert_eq!(state.current_player_index, 1);
    assert_eq!(state.players[0].turns_remaining, 0);
    assert_eq!(state.players[1].turns_remaining, 2);

    let state = e.draw(&state, pid(1)).unwrap();
    assert_eq!(state.current_player_index, 1);
    assert_eq!(state.players[1].turns_remaining, 1);

    let state = e.draw(&state, pid(1)).unwrap();
    assert_eq!(state.current_player_index, 2);
    assert_eq!(state.players[2].turns_remaining, 1);
}

/// End turn spends one owed turn and only passes play when none are left.
#[test]
fn test_end_turn_spends_one_owed_turn() {
    let mut e = engine();
    let mut state = table(3, safe_pile(10));
    state.players[0].turns_remaining = 2;
    let first = give(&mut state, 0, 500, CardType::EndTurn);
    let second = give(&mut state, 0, 501, CardType::EndTurn);

    let state = e.apply(&state, pid(0), &Action::play(first), 0).unwrap();
    let (state, outcome) = e.resolve_window(&state, WINDOW_MS);
    assert_eq!(outcome, WindowOutcome::Resolved);
    assert_eq!(state.current_player_index, 0);
    assert_eq!(state.players[0].turns_remaining, 1);
    assert_eq!(state.draw_pile.len(), 10);

    let state = e.apply(&state, pid(0), &Action::play(second), WINDOW_MS).unwrap();
    let (state, _) = e.resolve_window(&state, WINDOW_MS * 2);
    assert_eq!(state.current_player_index, 1);
    assert_eq!(state.players[0].turns_remaining, 0);
    assert_eq!(state.players[1].turns_remaining, 1);
}

/// A pair moves exactly one card from the target to the actor.
#[test]
fn test_pair_steals_one_card() {
    let mut e = engine();
    let mut state = table(2, safe_pile(4));
    let tacos: Vec<CardId> = (0..2).map(|i| give(&mut state, 0, 500 + i, CardType::Taco)).collect();
    give(&mut state, 1, 510, CardType::Melon);

    let state = e
        .apply(&state, pid(0), &Action::play_set(&tacos, pid(1)), 0)
        .unwrap();
    let (state, outcome) = e.resolve_window(&state, WINDOW_MS);

    assert_eq!(outcome, WindowOutcome::Resolved);
    assert_eq!(state.players[0].hand.len(), 2);
    assert_eq!(state.players[1].hand.len(), 1);
    let stolen = state.players[0].hand.iter().find(|c| c.id != CardId::new(100)).unwrap();
    assert!([CardId::new(101), CardId::new(510)].contains(&stolen.id));
    assert_eq!(state.discard_pile.len(), 2);
    assert_eq!(state.current_player_index, 0);
}

/// Reorder waits for the new order of the top cards without ending the turn.
#[test]
fn test_reorder_card_awaits_new_order() {
    let mut e = engine();
    let mut state = table(2, safe_pile(5));
    let reorder = give(&mut state, 0, 500, CardType::Reorder);

    let state = e.apply(&state, pid(0), &Action::play(reorder), 0).unwrap();
    let (state, _) = e.resolve_window(&state, WINDOW_MS);
    assert_eq!(state.turn_phase(), TurnPhase::AwaitingReorder);
    assert_eq!(state.pending().map(|p| p.initiator), Some(pid(0)));

    let order = [CardId::new(2), CardId::new(0), CardId::new(1)];
    let state = e.reorder(&state, pid(0), &order).unwrap();
    let top: Vec<CardId> = state.top_cards(3).iter().map(|c| c.id).collect();
    assert_eq!(top, order);
    assert_eq!(state.turn_phase(), TurnPhase::Playing);
    assert_eq!(state.current_player_index, 0);
}

/// Bury waits for a card and position, then tucks the card into the pile.
#[test]
fn test_bury_card_awaits_choice() {
    let mut e = engine();
    let mut state = table(2, safe_pile(5));
    let bury = give(&mut state, 0, 500, CardType::Bury);
    let tucked = give(&mut state, 0, 501, CardType::Beard);

    let state = e.apply(&state, pid(0), &Action::play(bury), 0).unwrap();
    let (state, _) = e.resolve_window(&state, WINDOW_MS);
    assert_eq!(state.turn_phase(), TurnPhase::AwaitingBury);

    let state = e.bury(&state, pid(0), tucked, 3).unwrap();
    assert_eq!(state.draw_pile.len(), 6);
    assert_eq!(state.draw_pile[3].id, tucked);
    assert!(!state.players[0].holds(tucked));
    assert_eq!(state.turn_phase(), TurnPhase::Playing);
    assert_eq!(state.current_player_index, 0);
}

// =============================================================================
// Turn Order Tests
// =============================================================================

/// Turns skip an eliminated seat and wrap around in both directions.
#[test]
fn test_turns_skip_eliminated_player() {
    let mut e = engine();
    let mut state = table(4, safe_pile(10));
    state.players[2].is_alive = false;
    state.players[2].hand.clear();

    let mut order = Vec::new();
    for _ in 0..4 {
        let actor = state.current_player().id;
        order.push(actor.raw());
        state = e.draw(&state, actor).unwrap();
    }
    assert_eq!(order, vec![0, 1, 3, 0]);

    state.direction = TurnDirection::CounterClockwise;
    let mut order = Vec::new();
    for _ in 0..3 {
        let actor = state.current_player().id;
        order.push(actor.raw());
        state = e.draw(&state, actor).unwrap();
    }
    assert_eq!(order, vec![1, 0, 3]);
}

// =============================================================================
// Bomb Tests
// =============================================================================

/// Draw a bomb, rescue it and put it back at every legal position.
#[test]
fn test_bomb_round_trip() {
    let mut pile = vec![card(0, CardType::Bomb)];
    pile.extend((1..=10).map(|i| card(i, CardType::Potato)));

    for position in [0, 4, 10] {
        let mut e = engine();
        let state = table(2, pile.clone());

        let state = e.draw(&state, pid(0)).unwrap();
        assert_eq!(state.turn_phase(), TurnPhase::Exploded);
        assert!(Engine::doomed_player(&state).is_none());

        let state = e
            .apply(&state, pid(0), &Action::play(CardId::new(100)), 0)
            .unwrap();
        assert_eq!(state.turn_phase(), TurnPhase::PlacingBomb);
        assert_eq!(state.held_card().map(|c| c.id), Some(CardId::new(0)));

        let err = e.place_bomb(&state, pid(0), 11).unwrap_err();
        assert_eq!(err, RuleError::OutOfRangePosition { position: 11, max: 10 });

        let state = e.place_bomb(&state, pid(0), position).unwrap();
        assert_eq!(state.draw_pile.len(), 11);
        assert_eq!(state.draw_pile[position], card(0, CardType::Bomb));
        assert_eq!(state.current_player_index, 1);
        assert!(!state.players[0].holds_type(CardType::Rescue));

        if position == 0 {
            let state = e.draw(&state, pid(1)).unwrap();
            assert_eq!(state.turn_phase(), TurnPhase::Exploded);
            assert_eq!(state.current_player().id, pid(1));
        }
    }
}

/// A bomb drawn without a rescue card eliminates, and the last player wins.
#[test]
fn test_elimination_declares_winner() {
    let mut e = engine();
    let mut state = table(2, vec![card(0, CardType::Bomb), card(1, CardType::Potato)]);
    state.players[0].hand.clear();

    let state = e.draw(&state, pid(0)).unwrap();
    assert_eq!(Engine::doomed_player(&state), Some(pid(0)));

    let state = e.eliminate(&state, pid(0)).unwrap();
    assert_eq!(state.status, GameStatus::Finished);
    assert_eq!(state.winner, Some(pid(1)));
    assert!(state.players.iter().all(|p| !p.is_current_turn));

    let err = e.draw(&state, pid(1)).unwrap_err();
    assert_eq!(err, RuleError::GameFinished);
}

/// Three players: an elimination passes the turn on without ending the game.
#[test]
fn test_elimination_passes_turn() {
    let mut e = engine();
    let mut state = table(3, vec![card(0, CardType::Bomb), card(1, CardType::Potato)]);
    state.players[0].hand.clear();

    let state = e.draw(&state, pid(0)).unwrap();
    let state = e.eliminate(&state, pid(0)).unwrap();

    assert_eq!(state.status, GameStatus::Active);
    assert_eq!(state.current_player_index, 1);
    assert!(state.players[0].hand.is_empty());
    assert_eq!(state.alive_count(), 2);
}

// =============================================================================
// Rejection Tests
// =============================================================================

/// Rejected actions leave the snapshot byte-for-byte unchanged.
#[test]
fn test_rejections_leave_state_untouched() {
    let mut e = engine();
    let mut state = table(3, safe_pile(6));
    let gift = give(&mut state, 0, 500, CardType::Gift);
    let taco = give(&mut state, 0, 501, CardType::Taco);
    let cancel = give(&mut state, 1, 502, CardType::Cancel);
    let before = bincode::serialize(&state).unwrap();

    let attempts: Vec<(PlayerId, Action, RuleError)> = vec![
        (pid(1), Action::Draw, RuleError::NotYourTurn { player: pid(1) }),
        (
            pid(0),
            Action::play(CardId::new(999)),
            RuleError::CardNotInHand { card: CardId::new(999) },
        ),
        (pid(0), Action::PlaceBomb { position: 0 }, RuleError::WrongPhase { phase: TurnPhase::Playing }),
        (pid(1), Action::play(cancel), RuleError::WrongPhase { phase: TurnPhase::Playing }),
        (pid(0), Action::play_at(gift, pid(0)), RuleError::InvalidTarget),
        (pid(0), Action::play_set(&[taco], pid(1)), RuleError::MismatchedSet),
        (pid(7), Action::Draw, RuleError::PlayerNotFound { player: pid(7) }),
    ];

    for (actor, action, expected) in attempts {
        let err = e.apply(&state, actor, &action, 0).unwrap_err();
        assert_eq!(err, expected, "{}", action.name());
        assert_eq!(bincode::serialize(&state).unwrap(), before, "{}", action.name());
    }
}

/// A triple steals the named type when the target holds one.
#[test]
fn test_triple_steals_named_card() {
    let mut e = engine();
    let mut state = table(2, safe_pile(4));
    let tacos: Vec<CardId> = (0..3).map(|i| give(&mut state, 0, 500 + i, CardType::Taco)).collect();
    give(&mut state, 1, 510, CardType::Peek);

    let state = e
        .apply(&state, pid(0), &Action::play_triple(&tacos, pid(1), CardType::Peek), 0)
        .unwrap();
    let (state, outcome) = e.resolve_window(&state, WINDOW_MS);

    assert_eq!(outcome, WindowOutcome::Resolved);
    assert!(state.players[0].holds(CardId::new(510)));
    assert!(!state.players[1].holds_type(CardType::Peek));
    assert_eq!(state.discard_pile.len(), 3);
}
