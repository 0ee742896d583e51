use serde::{Deserialize, Serialize};

/// Aggregated record of one competitor. Rebuilt from scratch on every
/// standings computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub player_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default, alias = "setsFor")]
    pub sets_won: u32,
    #[serde(default, alias = "setsAgainst")]
    pub sets_lost: u32,
    #[serde(default, alias = "pointsFor")]
    pub points_won: u32,
    #[serde(default, alias = "pointsAgainst")]
    pub points_lost: u32,
    #[serde(default)]
    pub set_difference: i64,
    #[serde(default)]
    pub point_difference: i64,
    #[serde(default)]
    pub win_percentage: f64,
    #[serde(default)]
    pub rank: u32,
}

impl StandingsRow {
    pub fn new(player_id: impl Into<String>, group_id: Option<String>) -> Self {
        Self {
            player_id: player_id.into(),
            group_id,
            ..Default::default()
        }
    }
}

/// Ranked table of a single group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupStandings {
    pub group_id: String,
    #[serde(default)]
    pub table: Vec<StandingsRow>,
}

impl GroupStandings {
    pub fn first(&self) -> Option<&str> {
        self.table.first().map(|r| r.player_id.as_str())
    }

    pub fn second(&self) -> Option<&str> {
        self.table.get(1).map(|r| r.player_id.as_str())
    }
}
