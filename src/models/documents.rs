use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bracket::{BracketRound, Seed};
use super::standings::{GroupStandings, StandingsRow};
use super::tournament::{Category, Competitor, Group, Match, Phase};

/// Ordering keys applied by the standings calculation, most significant first.
pub const TIEBREAKERS: [&str; 4] = ["wins", "setDifference", "pointDifference", "winPercentage"];

/// Bookkeeping carried by every stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Players,
    Groups,
    GroupMatches,
    EliminationMatches,
    Standings,
    Bracket,
}

impl DocumentKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Players => "players.json",
            DocumentKind::Groups => "groups.json",
            DocumentKind::GroupMatches => "matches_group.json",
            DocumentKind::EliminationMatches => "matches_elim.json",
            DocumentKind::Standings => "standings_group.json",
            DocumentKind::Bracket => "bracket.json",
        }
    }

    pub fn matches(phase: Phase) -> Self {
        match phase {
            Phase::Group => DocumentKind::GroupMatches,
            Phase::Elimination => DocumentKind::EliminationMatches,
        }
    }
}

/// A whole JSON document stored under one repository key.
pub trait Document: Serialize + DeserializeOwned + Default + Clone {
    /// Array field whose entries carry their own `category`.
    const CATEGORISED_ENTRIES: Option<&'static str> = None;

    fn revision(&self) -> &Revision;
    fn revision_mut(&mut self) -> &mut Revision;
}

/// Older documents leave `category` off their entries; the key they are stored
/// under already names it.
pub fn fill_category<D: Document>(body: &mut Value, category: Category) {
    let Some(field) = D::CATEGORISED_ENTRIES else {
        return;
    };
    let Some(entries) = body.get_mut(field).and_then(Value::as_array_mut) else {
        return;
    };
    for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
        if entry.get("category").map_or(true, Value::is_null) {
            entry.insert("category".to_string(), Value::String(category.to_string()));
        }
    }
}

macro_rules! impl_document {
    ($($ty:ty $(=> $entries:literal)?),+ $(,)?) => {
        $(
            impl Document for $ty {
                $(const CATEGORISED_ENTRIES: Option<&'static str> = Some($entries);)?

                fn revision(&self) -> &Revision {
                    &self.revision
                }

                fn revision_mut(&mut self) -> &mut Revision {
                    &mut self.revision
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayersDocument {
    #[serde(default)]
    pub players: Vec<Competitor>,
    #[serde(flatten)]
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GroupsDocument {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(flatten)]
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MatchesDocument {
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(flatten)]
    pub revision: Revision,
}

impl MatchesDocument {
    pub fn find(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandingsDocument {
    #[serde(default)]
    pub overall: Vec<StandingsRow>,
    #[serde(default)]
    pub groups: Vec<GroupStandings>,
    #[serde(default)]
    pub tiebreakers: Vec<String>,
    #[serde(flatten)]
    pub revision: Revision,
}

impl Default for StandingsDocument {
    fn default() -> Self {
        Self {
            overall: Vec::new(),
            groups: Vec::new(),
            tiebreakers: TIEBREAKERS.iter().map(|t| t.to_string()).collect(),
            revision: Revision::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BracketDocument {
    #[serde(default)]
    pub seeds: Vec<Seed>,
    #[serde(default)]
    pub rounds: Vec<BracketRound>,
    #[serde(flatten)]
    pub revision: Revision,
}

impl_document!(
    PlayersDocument => "players",
    GroupsDocument,
    MatchesDocument => "matches",
    StandingsDocument,
    BracketDocument,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_is_flattened() {
        let doc = GroupsDocument {
            groups: vec![Group { id: "G1".to_string(), players: vec!["p_1".to_string()] }],
            revision: Revision { updated_at: None, version: 4 },
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], 4);
        assert!(value.get("revision").is_none());
    }

    #[test]
    fn test_legacy_document_without_revision() {
        let doc: MatchesDocument = serde_json::from_str(r#"{"matches": []}"#).unwrap();
        assert_eq!(doc.revision.version, 0);
        assert!(doc.revision.updated_at.is_none());
    }

    #[test]
    fn test_bracket_written_matches_take_category_from_key() {
        let mut body: Value = serde_json::from_str(
            r#"{
                "matches": [
                    {"id": "me_q1", "phase": "elim", "roundName": "Quarterfinals",
                     "p1": "p_a", "p2": "p_b",
                     "sets": [{"p1":0,"p2":0},{"p1":0,"p2":0},{"p1":0,"p2":0},{"p1":0,"p2":0},{"p1":0,"p2":0}],
                     "winner": null, "status": "scheduled",
                     "advancesTo": {"matchId": "me_s1", "as": "p1"}},
                    {"id": "me_s1", "phase": "elim", "roundName": "Semifinals",
                     "p1": "", "p2": "", "sets": [], "winner": null, "status": "scheduled",
                     "advancesTo": null, "scheduledAt": null, "updatedBy": null}
                ],
                "updatedAt": "2024-05-01T10:00:00Z",
                "version": 1
            }"#,
        )
        .unwrap();
        assert!(serde_json::from_value::<MatchesDocument>(body.clone()).is_err());

        fill_category::<MatchesDocument>(&mut body, Category::B);
        let doc: MatchesDocument = serde_json::from_value(body).unwrap();
        assert_eq!(doc.revision.version, 1);
        assert!(doc.matches.iter().all(|m| m.category == Category::B));
        assert_eq!(doc.find("me_q1").and_then(|m| m.advances_to.clone()).map(|a| a.match_id), Some("me_s1".to_string()));
    }

    #[test]
    fn test_stored_category_is_kept() {
        let mut body = serde_json::json!({
            "players": [{"id": "p_1", "name": "Ana", "category": "woman"}, {"id": "p_2"}]
        });
        fill_category::<PlayersDocument>(&mut body, Category::A);
        let doc: PlayersDocument = serde_json::from_value(body).unwrap();
        assert_eq!(doc.players[0].category, Category::B);
        assert_eq!(doc.players[1].category, Category::A);

        let mut groups = serde_json::json!({"groups": [{"id": "G1", "players": []}]});
        fill_category::<GroupsDocument>(&mut groups, Category::A);
        assert!(groups["groups"][0].get("category").is_none());
    }

    #[test]
    fn test_default_standings_lists_applied_tiebreakers() {
        let doc = StandingsDocument::default();
        assert_eq!(doc.tiebreakers, vec!["wins", "setDifference", "pointDifference", "winPercentage"]);
    }
}
