use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Number of sets stored on every match, played or not.
pub const SETS_PER_MATCH: usize = 5;

/// Tournament division. Competitors, groups, matches and standings never cross
/// categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(alias = "a", alias = "man")]
    A,
    #[serde(alias = "b", alias = "woman")]
    B,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::A, Category::B];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::A => write!(f, "A"),
            Category::B => write!(f, "B"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" | "man" => Ok(Category::A),
            "B" | "b" | "woman" => Ok(Category::B),
            other => Err(format!("category must be A|B, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Group,
    #[serde(alias = "elim")]
    Elimination,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Group => write!(f, "group"),
            Phase::Elimination => write!(f, "elimination"),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "group" => Ok(Phase::Group),
            "elimination" | "elim" => Ok(Phase::Elimination),
            other => Err(format!("phase must be group|elimination, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    #[serde(alias = "pending")]
    Scheduled,
    InProgress,
    Final,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Final => write!(f, "final"),
        }
    }
}

/// One of the two competitor positions of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    P1,
    P2,
}

impl Slot {
    /// Slot fed by the `index`-th match of a round in its successor.
    pub fn for_feeder(index: usize) -> Self {
        if index % 2 == 0 {
            Slot::P1
        } else {
            Slot::P2
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::P1 => write!(f, "p1"),
            Slot::P2 => write!(f, "p2"),
        }
    }
}

/// Points scored by each side in a single set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SetScore {
    pub p1: u32,
    pub p2: u32,
}

impl SetScore {
    pub fn new(p1: u32, p2: u32) -> Self {
        Self { p1, p2 }
    }
}

/// Stored set lists may be empty or short (matches created without scores);
/// they are padded with unplayed sets, and extra entries are dropped.
fn deserialize_sets<'de, D>(deserializer: D) -> Result<[SetScore; SETS_PER_MATCH], D::Error>
where
    D: Deserializer<'de>,
{
    let stored: Option<Vec<SetScore>> = Option::deserialize(deserializer)?;
    let mut sets = [SetScore::default(); SETS_PER_MATCH];
    for (slot, set) in sets.iter_mut().zip(stored.unwrap_or_default()) {
        *slot = set;
    }
    Ok(sets)
}

/// Advancement edge: the winner of the owning match fills `slot` of `match_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdvancesTo {
    pub match_id: String,
    #[serde(alias = "as")]
    pub slot: Slot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub players: Vec<String>,
}

impl Group {
    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }
}

/// A best-of-five contest. Group and elimination matches share this record;
/// `group_id` is only meaningful in the group phase, `round_name` and
/// `advances_to` only in the elimination phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub category: Category,
    pub phase: Phase,
    #[serde(default)]
    pub p1: String,
    #[serde(default)]
    pub p2: String,
    #[serde(default, deserialize_with = "deserialize_sets")]
    pub sets: [SetScore; SETS_PER_MATCH],
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advances_to: Option<AdvancesTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Match {
    /// A fresh `scheduled` match with zeroed sets and no winner.
    pub fn scheduled(
        id: impl Into<String>,
        category: Category,
        phase: Phase,
        p1: impl Into<String>,
        p2: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            phase,
            p1: p1.into(),
            p2: p2.into(),
            sets: [SetScore::default(); SETS_PER_MATCH],
            winner: None,
            status: MatchStatus::Scheduled,
            advances_to: None,
            group_id: None,
            round_name: None,
            scheduled_at: None,
            updated_by: None,
        }
    }

    pub fn player(&self, slot: Slot) -> &str {
        match slot {
            Slot::P1 => &self.p1,
            Slot::P2 => &self.p2,
        }
    }

    pub fn set_player(&mut self, slot: Slot, player_id: impl Into<String>) {
        match slot {
            Slot::P1 => self.p1 = player_id.into(),
            Slot::P2 => self.p2 = player_id.into(),
        }
    }

    /// Whether `player_id` occupies either slot. Empty placeholders never match.
    pub fn involves(&self, player_id: &str) -> bool {
        !player_id.is_empty() && (self.p1 == player_id || self.p2 == player_id)
    }

    pub fn is_final(&self) -> bool {
        self.status == MatchStatus::Final
    }
}
