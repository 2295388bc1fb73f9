//! Turn advancement and win detection.
//!
//! These helpers mutate a snapshot in place; the engine calls them on its
//! private clone, never on the caller's state.

use crate::cards::{Card, CardType};
use crate::core::{GameState, GameStatus, Phase, Player, PlayerId, TurnDirection};

/// Index of the next living player after `from` in `direction`.
///
/// Wraps around and skips eliminated seats. Returns `from` when nobody
/// else is alive.
#[must_use]
pub fn next_living_index(players: &[Player], from: usize, direction: TurnDirection) -> usize {
    let n = players.len() as isize;
    let mut idx = from as isize;
    for _ in 0..players.len() {
        idx = (idx + direction.step()).rem_euclid(n);
        if players[idx as usize].is_alive {
            return idx as usize;
        }
    }
    from
}

/// Pass the turn to the next living player.
///
/// The outgoing player's owed turns are cleared. The incoming player owes
/// at least one turn, more if a stacking effect already granted them.
pub fn end_turn(state: &mut GameState) {
    let from = state.current_player_index;
    let next = next_living_index(&state.players, from, state.direction);

    let outgoing = &mut state.players[from];
    outgoing.is_current_turn = false;
    outgoing.turns_remaining = 0;

    let incoming = &mut state.players[next];
    incoming.is_current_turn = true;
    if incoming.turns_remaining == 0 {
        incoming.turns_remaining = 1;
    }

    state.current_player_index = next;
    state.phase = Phase::Playing;

    tracing::debug!(
        target: "powderkeg::rules",
        from = %state.players[from].id,
        to = %state.players[next].id,
        owed = state.players[next].turns_remaining,
        "turn passed"
    );
}

/// Spend one of the current player's owed turns.
///
/// Ends the turn when nothing is owed any more, otherwise play continues
/// with the same player.
pub fn consume_turn(state: &mut GameState) {
    let player = state.current_player_mut();
    player.turns_remaining = player.turns_remaining.saturating_sub(1);

    if player.turns_remaining == 0 {
        end_turn(state);
    } else {
        state.phase = Phase::Playing;
    }
}

/// Put a freshly drawn card into the current player's hand.
///
/// A bomb explodes the player; anything else spends a turn.
pub fn receive_draw(state: &mut GameState, card: Card) {
    state.current_player_mut().hand.push(card);

    if card.is(CardType::Bomb) {
        tracing::debug!(
            target: "powderkeg::rules",
            player = %state.current_player().id,
            "bomb drawn"
        );
        state.phase = Phase::Exploded;
    } else {
        consume_turn(state);
    }
}

/// Insert `card` into the draw pile at `position` (0 = next drawn).
///
/// Positions past the end are clamped to the bottom.
pub fn insert_into_draw_pile(state: &mut GameState, card: Card, position: usize) {
    let position = position.min(state.draw_pile.len());
    state.draw_pile.insert(position, card);
}

/// Remove a player from the game.
///
/// Their hand leaves play. Finishes the game when one player is left,
/// otherwise passes the turn on if it was theirs.
pub fn eliminate(state: &mut GameState, player: PlayerId) {
    let Some(idx) = state.player_index(player) else {
        return;
    };

    let seat = &mut state.players[idx];
    seat.is_alive = false;
    seat.hand.clear();
    seat.turns_remaining = 0;

    tracing::debug!(target: "powderkeg::rules", %player, "player eliminated");

    if check_game_over(state) {
        return;
    }

    if idx == state.current_player_index {
        end_turn(state);
    }
}

/// Finish the game if exactly one player is alive.
///
/// Returns whether the game is over.
pub fn check_game_over(state: &mut GameState) -> bool {
    let mut living = state.players.iter().filter(|p| p.is_alive);
    let (Some(last), None) = (living.next(), living.next()) else {
        return false;
    };
    let winner = last.id;

    state.status = GameStatus::Finished;
    state.winner = Some(winner);
    state.phase = Phase::Playing;
    for p in &mut state.players {
        p.is_current_turn = false;
    }

    tracing::debug!(target: "powderkeg::rules", %winner, "game finished");
    true
}
