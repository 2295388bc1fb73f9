//! Deck building and dealing.
//!
//! Dealing happens in two stages:
//!
//! 1. The regular cards (everything except bombs and rescues) are minted,
//!    shuffled, and `hand_size` of them go to each player together with
//!    exactly one rescue card.
//! 2. The remaining rescue cards and `N - 1` bombs join the leftover
//!    regular cards and the whole pile is shuffled again.
//!
//! No opening hand can therefore hold a bomb or a second rescue.

use im::Vector;

use super::definition::CardType;
use super::instance::{Card, CardIdAllocator};
use crate::core::{GameConfig, GameRng, Player, PlayerId, RuleError, RuleResult};

/// Opening hands and the draw pile for a new game.
#[derive(Clone, Debug)]
pub struct Deal {
    pub players: Vec<Player>,
    pub draw_pile: Vector<Card>,
}

/// Mint the regular cards of the configured table in table order.
pub fn regular_cards(config: &GameConfig, ids: &mut CardIdAllocator) -> Vec<Card> {
    config
        .card_counts
        .iter()
        .flat_map(|&(card_type, count)| std::iter::repeat(card_type).take(count as usize))
        .map(|card_type| ids.mint(card_type))
        .collect()
}

/// Deal a new game to the given seats.
///
/// Seats keep the order given. Fails with `InvalidPlayerCount` outside the
/// configured range and `DeckExhausted` if the table cannot fill every
/// hand.
pub fn deal(config: &GameConfig, seats: &[(PlayerId, String)], rng: &mut GameRng) -> RuleResult<Deal> {
    let n = seats.len();
    if !config.supports(n) {
        return Err(RuleError::InvalidPlayerCount {
            min: config.min_players,
            max: config.max_players,
            got: n,
        });
    }
    if config.rescue_total < n {
        return Err(RuleError::DeckExhausted);
    }

    let mut ids = CardIdAllocator::new();
    let mut regular = regular_cards(config, &mut ids);
    if regular.len() < config.hand_size * n {
        return Err(RuleError::DeckExhausted);
    }
    rng.shuffle(&mut regular);

    let mut pile = regular.into_iter();
    let players = seats
        .iter()
        .map(|(id, name)| {
            let mut player = Player::new(*id, name.clone());
            player.hand.extend(pile.by_ref().take(config.hand_size));
            player.hand.push(ids.mint(CardType::Rescue));
            player
        })
        .collect();

    let mut rest: Vec<Card> = pile.collect();
    rest.extend((0..config.rescue_total - n).map(|_| ids.mint(CardType::Rescue)));
    rest.extend((0..config.bomb_count(n)).map(|_| ids.mint(CardType::Bomb)));
    rng.shuffle(&mut rest);

    Ok(Deal {
        players,
        draw_pile: rest.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(n: u32) -> Vec<(PlayerId, String)> {
        (0..n).map(|i| (PlayerId::new(i), format!("p{i}"))).collect()
    }

    #[test]
    fn test_regular_cards_follow_table() {
        let config = GameConfig::default();
        let cards = regular_cards(&config, &mut CardIdAllocator::new());

        assert_eq!(cards.len(), 62);
        assert!(cards.iter().all(|c| !c.card_type.is_special()));
        assert_eq!(cards.iter().filter(|c| c.is(CardType::Peek)).count(), 5);
    }

    #[test]
    fn test_deal_three_players() {
        let config = GameConfig::default();
        let deal = deal(&config, &seats(3), &mut GameRng::new(42)).unwrap();

        for p in &deal.players {
            assert_eq!(p.hand_size(), 6);
            assert_eq!(p.hand.iter().filter(|c| c.is(CardType::Rescue)).count(), 1);
            assert!(!p.holds_type(CardType::Bomb));
        }
        let bombs = deal.draw_pile.iter().filter(|c| c.is(CardType::Bomb)).count();
        let rescues = deal.draw_pile.iter().filter(|c| c.is(CardType::Rescue)).count();
        assert_eq!(bombs, 2);
        assert_eq!(rescues, 3);
        assert_eq!(deal.draw_pile.len(), 62 - 15 + 3 + 2);
    }

    #[test]
    fn test_deal_is_deterministic() {
        let config = GameConfig::default();
        let a = deal(&config, &seats(4), &mut GameRng::new(9)).unwrap();
        let b = deal(&config, &seats(4), &mut GameRng::new(9)).unwrap();

        assert_eq!(a.draw_pile, b.draw_pile);
        assert_eq!(a.players, b.players);
    }

    #[test]
    fn test_deal_rejects_player_count() {
        let config = GameConfig::default();

        let err = deal(&config, &seats(1), &mut GameRng::new(1)).unwrap_err();
        assert_eq!(err, RuleError::InvalidPlayerCount { min: 2, max: 5, got: 1 });

        assert!(deal(&config, &seats(6), &mut GameRng::new(1)).is_err());
    }
}
