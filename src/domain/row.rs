//! LadderRow - One Ranked Entry of a Ladder

use serde::{Deserialize, Serialize};

use super::challenge::{sort_by_ladder_rank, CanChallenge, Challenge};
use super::player::Player;

/// A ladder row as returned by the paged players endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderRow {
    /// 1-based position on the ladder
    pub rank: u64,
    /// The player holding this position
    pub player: Player,
    /// Challenges other players issued against this one
    #[serde(default)]
    pub incoming_challenges: Vec<Challenge>,
    /// Challenges this player issued
    #[serde(default)]
    pub outgoing_challenges: Vec<Challenge>,
    /// Viewer's eligibility to challenge this player
    #[serde(default)]
    pub can_challenge: Option<CanChallenge>,
}

impl LadderRow {
    /// Order both challenge lists by opponent rank, unranked last
    pub fn sort_challenges(&mut self) {
        sort_by_ladder_rank(&mut self.incoming_challenges);
        sort_by_ladder_rank(&mut self.outgoing_challenges);
    }

    /// Whether the viewer is known to be unable to challenge this row
    pub fn is_not_challengeable(&self) -> bool {
        matches!(&self.can_challenge, Some(c) if !c.challengeable)
    }
}
