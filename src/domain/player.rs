//! Player - Ladder Participant Identity

use serde::{Deserialize, Serialize};

/// Ladder rank reported for players that are not on the ladder
pub const NO_LADDER_RANK: i64 = -1;

fn no_ladder_rank() -> i64 {
    NO_LADDER_RANK
}

/// A player as embedded in ladder rows and challenge references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Server-side user id
    pub id: u64,
    /// Display name
    pub username: String,
    /// Position on this ladder (negative when unranked)
    #[serde(default = "no_ladder_rank")]
    pub ladder_rank: i64,
    /// Rating, when the server includes it
    #[serde(default)]
    pub rating: Option<f64>,
    /// Kyu/dan ranking as a number, when the server includes it
    #[serde(default)]
    pub ranking: Option<f64>,
    /// ISO country code
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub professional: bool,
}

impl Player {
    /// Create a player with minimal info
    pub fn new(id: u64, username: impl Into<String>, ladder_rank: i64) -> Self {
        Self {
            id,
            username: username.into(),
            ladder_rank,
            rating: None,
            ranking: None,
            country: None,
            professional: false,
        }
    }

    /// Whether the player currently holds a ladder position
    pub fn is_ranked(&self) -> bool {
        self.ladder_rank >= 0
    }
}
