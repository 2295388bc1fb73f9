//! Deferred effects staged behind a challenge window.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{CardId, CardType};
use crate::core::PlayerId;

/// Concrete effect applied when a challenge window closes uncancelled.
///
/// Each variant carries exactly what its resolution needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DeferredEffect {
    /// Actor's remaining turns are dropped, the next player owes 2 more.
    ExtraTurn { actor: PlayerId },
    /// One owed turn ends without drawing.
    EndTurn { actor: PlayerId },
    Reshuffle { actor: PlayerId },
    /// Top 3 cards shown to the actor only.
    Peek { actor: PlayerId },
    RequestGift { actor: PlayerId, target: PlayerId },
    /// Two-card set: a uniformly random card from the target's hand.
    StealRandom {
        actor: PlayerId,
        target: PlayerId,
        cards: SmallVec<[CardId; 3]>,
        set_type: CardType,
    },
    /// Three-card set: a card of the named type, if the target has one.
    StealChosen {
        actor: PlayerId,
        target: PlayerId,
        cards: SmallVec<[CardId; 3]>,
        chosen: CardType,
        set_type: CardType,
    },
    ReverseDirection { actor: PlayerId },
    DrawFromBottom { actor: PlayerId },
    RevealAndReorder { actor: PlayerId },
    Bury { actor: PlayerId },
}

impl DeferredEffect {
    /// Effect staged by playing a single action card.
    ///
    /// Returns `None` for cards that do not stage an effect alone. Gift
    /// needs a target; the caller validates it first.
    #[must_use]
    pub fn for_card(card_type: CardType, actor: PlayerId, target: Option<PlayerId>) -> Option<Self> {
        let effect = match card_type {
            CardType::ExtraTurn => DeferredEffect::ExtraTurn { actor },
            CardType::EndTurn => DeferredEffect::EndTurn { actor },
            CardType::Reshuffle => DeferredEffect::Reshuffle { actor },
            CardType::Peek => DeferredEffect::Peek { actor },
            CardType::Gift => DeferredEffect::RequestGift { actor, target: target? },
            CardType::Reverse => DeferredEffect::ReverseDirection { actor },
            CardType::DrawFromBottom => DeferredEffect::DrawFromBottom { actor },
            CardType::Reorder => DeferredEffect::RevealAndReorder { actor },
            CardType::Bury => DeferredEffect::Bury { actor },
            _ => return None,
        };
        Some(effect)
    }

    #[must_use]
    pub fn actor(&self) -> PlayerId {
        match self {
            DeferredEffect::ExtraTurn { actor }
            | DeferredEffect::EndTurn { actor }
            | DeferredEffect::Reshuffle { actor }
            | DeferredEffect::Peek { actor }
            | DeferredEffect::RequestGift { actor, .. }
            | DeferredEffect::StealRandom { actor, .. }
            | DeferredEffect::StealChosen { actor, .. }
            | DeferredEffect::ReverseDirection { actor }
            | DeferredEffect::DrawFromBottom { actor }
            | DeferredEffect::RevealAndReorder { actor }
            | DeferredEffect::Bury { actor } => *actor,
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<PlayerId> {
        match self {
            DeferredEffect::RequestGift { target, .. }
            | DeferredEffect::StealRandom { target, .. }
            | DeferredEffect::StealChosen { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Card type shown while the effect is pending.
    #[must_use]
    pub fn card_type(&self) -> CardType {
        match self {
            DeferredEffect::ExtraTurn { .. } => CardType::ExtraTurn,
            DeferredEffect::EndTurn { .. } => CardType::EndTurn,
            DeferredEffect::Reshuffle { .. } => CardType::Reshuffle,
            DeferredEffect::Peek { .. } => CardType::Peek,
            DeferredEffect::RequestGift { .. } => CardType::Gift,
            DeferredEffect::StealRandom { set_type, .. }
            | DeferredEffect::StealChosen { set_type, .. } => *set_type,
            DeferredEffect::ReverseDirection { .. } => CardType::Reverse,
            DeferredEffect::DrawFromBottom { .. } => CardType::DrawFromBottom,
            DeferredEffect::RevealAndReorder { .. } => CardType::Reorder,
            DeferredEffect::Bury { .. } => CardType::Bury,
        }
    }
}
