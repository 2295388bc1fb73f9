//! The action state machine.
//!
//! Every operation takes a snapshot by reference and returns a new one.
//! Work happens on a private clone, so a rejected operation leaves the
//! caller's snapshot exactly as it was. `im` vectors keep the clone cheap.
//!
//! ## Phases and legal actions
//!
//! | Phase | Who | Legal |
//! |---|---|---|
//! | `Playing` | current player | action cards, matching sets, draw |
//! | `Exploded` | current player | rescue |
//! | `PlacingBomb` | rescuer | place bomb |
//! | `ChallengeWindow` | anyone holding one | cancel |
//! | `AwaitingGift` | gift target | respond to gift |
//! | `AwaitingPeek` | current player | as in `Playing` (dismisses the peek) |
//! | `AwaitingReorder` | initiator | reorder |
//! | `AwaitingBury` | initiator | bury |

use smallvec::SmallVec;

use super::turns;
use crate::cards::{deal, Card, CardId, CardType};
use crate::core::{
    Action, GameConfig, GameRng, GameState, GameStatus, Phase, Player, PlayerId, RuleError,
    RuleResult, TurnDirection, TurnPhase,
};
use crate::window::{self, DeferredEffect, ExpiryOutcome, PendingAction, WindowOutcome};

/// Rule engine for one game.
///
/// Owns the rule configuration and the RNG used for shuffles and random
/// steals. The snapshot itself is owned by the caller.
#[derive(Clone, Debug)]
pub struct Engine {
    config: GameConfig,
    rng: GameRng,
}

impl Engine {
    #[must_use]
    pub fn new(config: GameConfig, rng: GameRng) -> Self {
        Self { config, rng }
    }

    /// Engine with a fixed seed, for reproducible games.
    #[must_use]
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, GameRng::new(seed))
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Deal a new game. The first seat starts with one owed turn.
    pub fn new_game(&mut self, seats: &[(PlayerId, String)], now: u64) -> RuleResult<GameState> {
        let dealt = deal(&self.config, seats, &mut self.rng)?;

        let mut state = GameState {
            players: dealt.players,
            draw_pile: dealt.draw_pile,
            discard_pile: im::Vector::new(),
            current_player_index: 0,
            phase: Phase::Playing,
            status: GameStatus::Active,
            direction: TurnDirection::Clockwise,
            winner: None,
            created_at: now,
        };
        let first = &mut state.players[0];
        first.is_current_turn = true;
        first.turns_remaining = 1;

        tracing::debug!(
            target: "powderkeg::rules",
            players = seats.len(),
            draw_pile = state.draw_pile.len(),
            "game dealt"
        );
        Ok(self.checked(state))
    }

    /// Apply any player action.
    pub fn apply(&mut self, state: &GameState, actor: PlayerId, action: &Action, now: u64) -> RuleResult<GameState> {
        match action {
            Action::Draw => self.draw(state, actor),
            Action::PlayCard { card, target } => self.play_card(state, actor, *card, *target, now),
            Action::PlayMatchingSet {
                cards,
                target,
                chosen_type,
            } => self.play_matching_set(state, actor, cards, *target, *chosen_type, now),
            Action::PlaceBomb { position } => self.place_bomb(state, actor, *position),
            Action::RespondToGift { card } => self.respond_to_gift(state, actor, *card),
            Action::Reorder { order } => self.reorder(state, actor, order),
            Action::Bury { card, position } => self.bury(state, actor, *card, *position),
        }
    }

    /// Draw the front card of the draw pile.
    pub fn draw(&mut self, state: &GameState, actor: PlayerId) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        check_current(&next, actor)?;
        dismiss_peek(&mut next);
        check_phase(&next, &[TurnPhase::Playing])?;

        let card = next.draw_pile.pop_front().ok_or(RuleError::DeckExhausted)?;
        turns::receive_draw(&mut next, card);

        tracing::debug!(target: "powderkeg::rules", player = %actor, "card drawn");
        Ok(self.checked(next))
    }

    /// Play a single card from hand.
    ///
    /// Rescue answers an explosion, cancel votes in an open window, and
    /// every action card stages its effect behind a new window.
    pub fn play_card(
        &mut self,
        state: &GameState,
        actor: PlayerId,
        card_id: CardId,
        target: Option<PlayerId>,
        now: u64,
    ) -> RuleResult<GameState> {
        let mut next = state.clone();
        let player = check_living(&next, actor)?;
        let card = player
            .find_card(card_id)
            .map(|i| player.hand[i])
            .ok_or(RuleError::CardNotInHand { card: card_id })?;

        match card.card_type {
            CardType::Cancel => play_cancel(&mut next, actor, card, now)?,
            CardType::Rescue => self.play_rescue(&mut next, actor, card, now)?,
            CardType::Bomb => return Err(RuleError::NotPlayable { card_type: CardType::Bomb }),
            t if t.is_collectible() => return Err(RuleError::NotPlayable { card_type: t }),
            card_type => {
                check_current(&next, actor)?;
                dismiss_peek(&mut next);
                check_phase(&next, &[TurnPhase::Playing])?;

                let target = match card_type {
                    CardType::Gift => Some(check_target(&next, actor, target)?),
                    _ => None,
                };
                let effect = DeferredEffect::for_card(card_type, actor, target)
                    .ok_or(RuleError::NotPlayable { card_type })?;

                discard_from_hand(&mut next, actor, card.id);
                window::open_window(&mut next, effect, &self.config, now);
            }
        }

        Ok(self.checked(next))
    }

    fn play_rescue(&self, state: &mut GameState, actor: PlayerId, rescue: Card, now: u64) -> RuleResult<()> {
        check_current(state, actor)?;
        check_phase(state, &[TurnPhase::Exploded])?;

        let player = state.current_player_mut();
        let bomb = player.take_type(CardType::Bomb).ok_or(RuleError::WrongPhase {
            phase: TurnPhase::Exploded,
        })?;
        discard_from_hand(state, actor, rescue.id);

        let pending = PendingAction::starting(actor, Some(CardType::Rescue), now, self.config.bomb_placement_ms);
        state.phase = Phase::PlacingBomb { pending, bomb };

        tracing::debug!(target: "powderkeg::rules", player = %actor, "bomb rescued");
        Ok(())
    }

    /// Play 2 or 3 identical collectibles against `target`.
    ///
    /// Pairs steal a random card, triples steal a card of `chosen_type`
    /// when the target has one.
    pub fn play_matching_set(
        &mut self,
        state: &GameState,
        actor: PlayerId,
        cards: &[CardId],
        target: PlayerId,
        chosen_type: Option<CardType>,
        now: u64,
    ) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        check_current(&next, actor)?;
        dismiss_peek(&mut next);
        check_phase(&next, &[TurnPhase::Playing])?;

        if !(2..=3).contains(&cards.len()) {
            return Err(RuleError::MismatchedSet);
        }
        let mut distinct: SmallVec<[CardId; 3]> = SmallVec::from_slice(cards);
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != cards.len() {
            return Err(RuleError::MismatchedSet);
        }

        let player = current_of(&next, actor);
        let mut set_type = None;
        for &id in cards {
            let idx = player.find_card(id).ok_or(RuleError::CardNotInHand { card: id })?;
            let card_type = player.hand[idx].card_type;
            if !card_type.is_collectible() || set_type.is_some_and(|t| t != card_type) {
                return Err(RuleError::MismatchedSet);
            }
            set_type = Some(card_type);
        }
        let set_type = set_type.ok_or(RuleError::MismatchedSet)?;

        let chosen = match (cards.len(), chosen_type) {
            (3, None) => return Err(RuleError::MissingChosenType),
            (3, Some(t)) => Some(t),
            _ => None,
        };
        let target = check_target(&next, actor, Some(target))?;

        for &id in cards {
            discard_from_hand(&mut next, actor, id);
        }
        let cards = SmallVec::from_slice(cards);
        let effect = match chosen {
            Some(chosen) => DeferredEffect::StealChosen {
                actor,
                target,
                cards,
                chosen,
                set_type,
            },
            None => DeferredEffect::StealRandom {
                actor,
                target,
                cards,
                set_type,
            },
        };
        window::open_window(&mut next, effect, &self.config, now);

        Ok(self.checked(next))
    }

    /// Put the rescued bomb back into the draw pile.
    pub fn place_bomb(&mut self, state: &GameState, actor: PlayerId, position: usize) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        let Phase::PlacingBomb { pending, bomb } = &next.phase else {
            return Err(wrong_phase(&next));
        };
        if pending.initiator != actor {
            return Err(RuleError::NotYourTurn { player: actor });
        }
        let max = next.draw_pile.len();
        if position > max {
            return Err(RuleError::OutOfRangePosition { position, max });
        }

        let bomb = *bomb;
        next.phase = Phase::Playing;
        turns::insert_into_draw_pile(&mut next, bomb, position);
        turns::consume_turn(&mut next);

        tracing::debug!(target: "powderkeg::rules", player = %actor, position, "bomb placed");
        Ok(self.checked(next))
    }

    /// Hand a card to the player who asked for a gift.
    pub fn respond_to_gift(&mut self, state: &GameState, actor: PlayerId, card: CardId) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        let Phase::AwaitingGift { pending, giver } = &next.phase else {
            return Err(wrong_phase(&next));
        };
        if *giver != actor {
            return Err(RuleError::NotYourTurn { player: actor });
        }
        let receiver = pending.initiator;

        let gift = next
            .player_mut(actor)
            .and_then(|p| p.take_card(card))
            .ok_or(RuleError::CardNotInHand { card })?;
        if let Some(p) = next.player_mut(receiver) {
            p.hand.push(gift);
        }
        next.phase = Phase::Playing;

        tracing::debug!(target: "powderkeg::rules", from = %actor, to = %receiver, "gift given");
        Ok(self.checked(next))
    }

    /// Rewrite the order of the revealed top cards.
    ///
    /// `order` must name every revealed card exactly once.
    pub fn reorder(&mut self, state: &GameState, actor: PlayerId, order: &[CardId]) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        let Phase::AwaitingReorder { pending } = &next.phase else {
            return Err(wrong_phase(&next));
        };
        if pending.initiator != actor {
            return Err(RuleError::NotYourTurn { player: actor });
        }

        let top = next.top_cards(3);
        if order.len() != top.len() {
            return Err(RuleError::InvalidOrder);
        }
        let mut reordered = Vec::with_capacity(top.len());
        for id in order {
            let card = top.iter().find(|c| c.id == *id).ok_or(RuleError::InvalidOrder)?;
            if reordered.contains(card) {
                return Err(RuleError::InvalidOrder);
            }
            reordered.push(*card);
        }

        let rest = next.draw_pile.split_off(top.len());
        next.draw_pile = reordered.into_iter().collect();
        next.draw_pile.append(rest);
        next.phase = Phase::Playing;

        tracing::debug!(target: "powderkeg::rules", player = %actor, "top cards reordered");
        Ok(self.checked(next))
    }

    /// Hide a card from hand in the draw pile.
    pub fn bury(&mut self, state: &GameState, actor: PlayerId, card: CardId, position: usize) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, actor)?;
        let Phase::AwaitingBury { pending } = &next.phase else {
            return Err(wrong_phase(&next));
        };
        if pending.initiator != actor {
            return Err(RuleError::NotYourTurn { player: actor });
        }
        let max = next.draw_pile.len();
        if position > max {
            return Err(RuleError::OutOfRangePosition { position, max });
        }

        let buried = next
            .player_mut(actor)
            .and_then(|p| p.take_card(card))
            .ok_or(RuleError::CardNotInHand { card })?;
        turns::insert_into_draw_pile(&mut next, buried, position);
        next.phase = Phase::Playing;

        tracing::debug!(target: "powderkeg::rules", player = %actor, position, "card buried");
        Ok(self.checked(next))
    }

    /// Eliminate a living player.
    ///
    /// Their hand leaves play. The game finishes when one player remains.
    pub fn eliminate(&mut self, state: &GameState, player: PlayerId) -> RuleResult<GameState> {
        let mut next = state.clone();
        check_living(&next, player)?;

        turns::eliminate(&mut next, player);
        Ok(self.checked(next))
    }

    /// Close the open challenge window. No-op when none is open.
    pub fn resolve_window(&mut self, state: &GameState, now: u64) -> (GameState, WindowOutcome) {
        let mut next = state.clone();
        let outcome = window::resolve_window(&mut next, &mut self.rng, &self.config, now);
        (self.checked(next), outcome)
    }

    /// Close the pending phase if its deadline has passed.
    pub fn expire(&mut self, state: &GameState, now: u64) -> (GameState, ExpiryOutcome) {
        let mut next = state.clone();
        let outcome = window::expire_pending(&mut next, &mut self.rng, &self.config, now);
        (self.checked(next), outcome)
    }

    /// Exploded player with no rescue card left, if any.
    #[must_use]
    pub fn doomed_player(state: &GameState) -> Option<PlayerId> {
        let player = state.current_player();
        (!state.is_finished()
            && state.phase == Phase::Exploded
            && !player.holds_type(CardType::Rescue))
        .then_some(player.id)
    }

    fn checked(&self, state: GameState) -> GameState {
        if cfg!(debug_assertions) {
            state.assert_consistent();
        }
        state
    }
}

fn wrong_phase(state: &GameState) -> RuleError {
    RuleError::WrongPhase {
        phase: state.turn_phase(),
    }
}

/// Actor exists, is alive and the game is still running.
fn check_living(state: &GameState, actor: PlayerId) -> RuleResult<&Player> {
    if state.is_finished() {
        return Err(RuleError::GameFinished);
    }
    let player = state.player(actor).ok_or(RuleError::PlayerNotFound { player: actor })?;
    if !player.is_alive {
        return Err(RuleError::PlayerEliminated { player: actor });
    }
    Ok(player)
}

fn check_current(state: &GameState, actor: PlayerId) -> RuleResult<()> {
    if state.current_player().id != actor {
        return Err(RuleError::NotYourTurn { player: actor });
    }
    Ok(())
}

fn check_phase(state: &GameState, allowed: &[TurnPhase]) -> RuleResult<()> {
    if !allowed.contains(&state.turn_phase()) {
        return Err(wrong_phase(state));
    }
    Ok(())
}

/// Living opponent who holds at least one card.
fn check_target(state: &GameState, actor: PlayerId, target: Option<PlayerId>) -> RuleResult<PlayerId> {
    let target = target.ok_or(RuleError::InvalidTarget)?;
    let player = state
        .player(target)
        .filter(|p| p.is_alive && p.id != actor)
        .ok_or(RuleError::InvalidTarget)?;
    if player.hand.is_empty() {
        return Err(RuleError::EmptyTargetHand);
    }
    Ok(target)
}

fn current_of(state: &GameState, actor: PlayerId) -> &Player {
    debug_assert_eq!(state.current_player().id, actor);
    state.current_player()
}

/// An accepted action by the current player ends a peek display.
fn dismiss_peek(state: &mut GameState) {
    if matches!(state.phase, Phase::AwaitingPeek { .. }) {
        state.phase = Phase::Playing;
    }
}

fn discard_from_hand(state: &mut GameState, actor: PlayerId, card: CardId) {
    if let Some(card) = state.player_mut(actor).and_then(|p| p.take_card(card)) {
        state.discard_pile.push_back(card);
    }
}

fn play_cancel(state: &mut GameState, actor: PlayerId, card: Card, now: u64) -> RuleResult<()> {
    let phase = state.turn_phase();
    let Phase::ChallengeWindow { pending, .. } = &mut state.phase else {
        return Err(RuleError::WrongPhase { phase });
    };
    if pending.is_expired(now) {
        return Err(RuleError::WindowExpired);
    }
    pending.cancels.push(actor);
    let cancels = pending.cancels.len();
    discard_from_hand(state, actor, card.id);

    tracing::debug!(target: "powderkeg::rules", player = %actor, cancels, "cancel played");
    Ok(())
}
