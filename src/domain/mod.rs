//! Domain - Pure Data Structures and Wire Types
//!
//! These types don't depend on the cache or the transport and represent the
//! ladder as the server describes it.

pub mod challenge;
pub mod config;
pub mod ladder;
pub mod player;
pub mod row;

pub use challenge::{CanChallenge, Challenge};
pub use ladder::{Ladder, LadderGroup, LadderId, PlayersPage};
pub use player::Player;
pub use row::LadderRow;
