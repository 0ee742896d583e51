use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use super::bracket::{BracketRound, Seed};
use super::tournament::{AdvancesTo, Group, MatchStatus, Phase};

fn zero() -> Value {
    Value::from(0)
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Set score exactly as submitted by a caller, before normalisation.
/// A missing side counts as 0; anything other than an integer is rejected later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSetScore {
    #[serde(default = "zero")]
    pub p1: Value,
    #[serde(default = "zero")]
    pub p2: Value,
}

impl RawSetScore {
    pub fn new(p1: impl Into<Value>, p2: impl Into<Value>) -> Self {
        Self { p1: p1.into(), p2: p2.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    pub phase: Phase,
    pub status: MatchStatus,
    pub sets: Vec<RawSetScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertGroupRequest {
    #[validate(length(max = 64))]
    pub players: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    pub phase: Phase,
    #[serde(alias = "player1")]
    #[validate(length(min = 1, max = 64))]
    pub p1: String,
    #[serde(alias = "player2")]
    #[validate(length(min = 1, max = 64))]
    pub p2: String,
    #[serde(default)]
    pub status: MatchStatus,
    pub sets: Option<Vec<RawSetScore>>,
    pub group_id: Option<String>,
    pub round_name: Option<String>,
    pub advances_to: Option<AdvancesTo>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial administrative edit. Nullable fields accept `null` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub phase: Option<Phase>,
    #[serde(alias = "player1")]
    #[validate(length(min = 1, max = 64))]
    pub p1: Option<String>,
    #[serde(alias = "player2")]
    #[validate(length(min = 1, max = 64))]
    pub p2: Option<String>,
    pub status: Option<MatchStatus>,
    pub sets: Option<Vec<RawSetScore>>,
    pub round_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub advances_to: Option<Option<AdvancesTo>>,
}

/// Without a phase, group matches are listed before elimination matches and
/// lookups search both phases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseQuery {
    pub phase: Option<Phase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedGroups {
    pub groups: Vec<Group>,
    pub matches_created: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeededBracketResponse {
    pub seeds: Vec<Seed>,
    pub rounds: Vec<BracketRound>,
    pub matches_created: usize,
}
