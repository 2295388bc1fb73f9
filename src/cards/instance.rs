//! Card instances - individual physical cards in a game.
//!
//! A `Card` is immutable once created: an identity plus a type. Only its
//! location changes, and that is tracked by whichever hand or pile holds it.

use serde::{Deserialize, Serialize};

use super::definition::CardType;

/// Unique identifier for a card within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// A physical card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "type")]
    pub card_type: CardType,
}

impl Card {
    #[must_use]
    pub const fn new(id: CardId, card_type: CardType) -> Self {
        Self { id, card_type }
    }

    #[must_use]
    pub fn is(&self, card_type: CardType) -> bool {
        self.card_type == card_type
    }
}

/// Hands out sequential card IDs for one game.
#[derive(Clone, Debug, Default)]
pub struct CardIdAllocator {
    next: u32,
}

impl CardIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new card of the given type.
    pub fn mint(&mut self, card_type: CardType) -> Card {
        let id = CardId::new(self.next);
        self.next += 1;
        Card::new(id, card_type)
    }

    /// Number of cards minted so far.
    #[must_use]
    pub fn minted(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_id() {
        let id = CardId::new(5);
        assert_eq!(id.raw(), 5);
        assert_eq!(format!("{}", id), "Card(5)");
    }

    #[test]
    fn test_allocator_is_sequential() {
        let mut ids = CardIdAllocator::new();

        let a = ids.mint(CardType::Bomb);
        let b = ids.mint(CardType::Cancel);

        assert_eq!(a.id, CardId::new(0));
        assert_eq!(b.id, CardId::new(1));
        assert!(b.is(CardType::Cancel));
        assert_eq!(ids.minted(), 2);
    }

    #[test]
    fn test_card_wire_format() {
        let card = Card::new(CardId::new(3), CardType::Reshuffle);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"id":3,"type":"reshuffle"}"#);
    }
}
