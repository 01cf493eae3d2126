//! Ladder - Ladder Metadata and Page Envelope

use serde::{Deserialize, Serialize};

use super::row::LadderRow;

/// Server-side ladder identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LadderId(pub u64);

impl LadderId {
    /// Push channel carrying this ladder's notifications
    pub fn channel(&self) -> String {
        format!("ladder-{}", self.0)
    }

    /// Path of the paged players collection
    pub fn players_path(&self) -> String {
        format!("ladders/{}/players", self.0)
    }
}

impl std::fmt::Display for LadderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LadderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(LadderId)
    }
}

/// Group owning a ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderGroup {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Ladder metadata from `ladders/<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub id: LadderId,
    pub name: String,
    /// Number of ranked players
    pub size: usize,
    #[serde(default)]
    pub group: Option<LadderGroup>,
    #[serde(default)]
    pub player_is_member_of_group: bool,
    /// Viewer's rank; zero or negative when not on the ladder
    #[serde(default)]
    pub player_rank: i64,
    #[serde(default)]
    pub rules: Option<String>,
    /// -1 means automatic handicap
    #[serde(default)]
    pub handicap: Option<i64>,
}

impl Ladder {
    /// Viewer's rank when they are on the ladder
    pub fn own_rank(&self) -> Option<u64> {
        u64::try_from(self.player_rank).ok().filter(|r| *r > 0)
    }

    /// Whether the viewer may join or leave (group ladders need membership)
    pub fn membership_allowed(&self) -> bool {
        self.group.is_none() || self.player_is_member_of_group
    }

    pub fn rules_text(&self) -> &str {
        self.rules.as_deref().unwrap_or("japanese")
    }

    pub fn handicap_text(&self) -> &'static str {
        if self.handicap == Some(-1) {
            "Automatic"
        } else {
            "None"
        }
    }

    /// Link to the owning group's page
    pub fn group_url(&self) -> Option<String> {
        self.group.as_ref().map(|g| format!("/group/{}", g.id))
    }
}

/// One page of the players collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayersPage {
    pub results: Vec<LadderRow>,
}
