//! Challenge - Ladder Challenge References and Eligibility

use serde::{Deserialize, Serialize};

use super::player::Player;
use crate::constants::UNRANKED_SORT_KEY;

/// A challenge between two ladder members, seen from one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Game played for this challenge
    pub game_id: u64,
    /// The opponent
    pub player: Player,
}

impl Challenge {
    /// Ordering key: ladder rank, with unranked opponents last
    pub fn sort_key(&self) -> i64 {
        if self.player.ladder_rank < 0 {
            UNRANKED_SORT_KEY
        } else {
            self.player.ladder_rank
        }
    }
}

/// Sort challenges by opponent ladder rank, unranked opponents last.
///
/// Stable, so challenges sharing a rank keep the server's order.
pub fn sort_by_ladder_rank(challenges: &mut [Challenge]) {
    challenges.sort_by_key(Challenge::sort_key);
}

/// Reason codes returned by the server when a challenge is refused
pub mod reason {
    pub const SELF_CHALLENGE: u32 = 0x001;
    pub const POSITION_LOWER: u32 = 0x002;
    pub const NOT_IN_LADDER: u32 = 0x003;
    pub const POSITION_TOO_HIGH: u32 = 0x004;
    pub const TOO_MANY_INITIATED: u32 = 0x005;
    pub const ALREADY_PLAYING: u32 = 0x006;
    pub const RECENT_CHALLENGE: u32 = 0x007;
    pub const MAX_CHALLENGES: u32 = 0x008;
}

/// Whether the viewer may challenge the player on a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CanChallenge {
    pub challengeable: bool,
    #[serde(default)]
    pub reason_code: Option<u32>,
    #[serde(default)]
    pub reason_parameter: Option<serde_json::Value>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CanChallenge {
    /// Human-readable explanation for a refused challenge
    pub fn reason_text(&self) -> Option<String> {
        let text = match self.reason_code.unwrap_or(0) {
            reason::SELF_CHALLENGE => Some("Can't challenge yourself".to_string()),
            reason::POSITION_LOWER => {
                Some("Their ladder position is lower than yours".to_string())
            }
            reason::NOT_IN_LADDER => Some("Player is not in the ladder".to_string()),
            reason::POSITION_TOO_HIGH => Some("Their ladder position is too high".to_string()),
            reason::TOO_MANY_INITIATED => Some(format!(
                "Already playing {} games you've initiated",
                self.reason_parameter_text()
            )),
            reason::ALREADY_PLAYING => {
                Some("Already playing a game against this person".to_string())
            }
            reason::RECENT_CHALLENGE => Some("Last challenge within 7 days".to_string()),
            reason::MAX_CHALLENGES => {
                Some("Player already has the maximum number of challenges".to_string())
            }
            _ => None,
        };

        text.or_else(|| self.reason.clone().filter(|r| !r.is_empty()))
    }

    fn reason_parameter_text(&self) -> String {
        match &self.reason_parameter {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        }
    }
}
