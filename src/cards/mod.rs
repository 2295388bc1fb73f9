//! Card catalog and deck model.
//!
//! ## Key Types
//!
//! - `CardType`: The fixed catalog (bomb, rescue, cancel, effect cards and
//!   collectibles) with display names and rule text
//! - `Card` / `CardId`: A physical card, unique within one game
//! - `Deal`: Opening hands plus the shuffled draw pile

pub mod deck;
pub mod definition;
pub mod instance;

pub use deck::{deal, regular_cards, Deal};
pub use definition::CardType;
pub use instance::{Card, CardId, CardIdAllocator};
