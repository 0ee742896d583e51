//! Winner advancement along bracket edges.

use std::collections::{HashMap, HashSet};

use crate::models::{Match, Slot};

/// Outcome of pushing one match's winner into its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// The downstream slot now holds the winner.
    Advanced { match_id: String, slot: Slot, player_id: String },
    /// The downstream slot already held the winner; nothing changed.
    Unchanged { match_id: String, slot: Slot },
    /// The source match is not final or has no winner.
    NotReady,
    /// The source match has no advancement edge.
    NoEdge,
    /// The edge points at a match that does not exist, or back at the source.
    MissingTarget { match_id: String },
}

impl Propagation {
    pub fn changed(&self) -> bool {
        matches!(self, Propagation::Advanced { .. })
    }
}

/// Single-hop advancement: copy `source`'s winner into the slot named by its
/// `advances_to` edge. Later rounds are not touched; they advance when their
/// own results are recorded.
pub fn propagate(source: &Match, matches: &mut [Match]) -> Propagation {
    let Some(edge) = source.advances_to.as_ref() else {
        return Propagation::NoEdge;
    };
    if !source.is_final() {
        return Propagation::NotReady;
    }
    let Some(winner) = source.winner.as_deref().filter(|w| !w.is_empty()) else {
        return Propagation::NotReady;
    };
    if edge.match_id == source.id {
        return Propagation::MissingTarget { match_id: edge.match_id.clone() };
    }

    let Some(target) = matches.iter_mut().find(|m| m.id == edge.match_id) else {
        return Propagation::MissingTarget { match_id: edge.match_id.clone() };
    };
    if target.player(edge.slot) == winner {
        return Propagation::Unchanged { match_id: target.id.clone(), slot: edge.slot };
    }

    target.set_player(edge.slot, winner);
    Propagation::Advanced {
        match_id: target.id.clone(),
        slot: edge.slot,
        player_id: winner.to_string(),
    }
}

/// First match (in list order) whose advancement chain loops back on itself.
pub fn find_cycle(matches: &[Match]) -> Option<String> {
    let edges: HashMap<&str, &str> = matches
        .iter()
        .filter_map(|m| m.advances_to.as_ref().map(|a| (m.id.as_str(), a.match_id.as_str())))
        .collect();

    for start in matches.iter().map(|m| m.id.as_str()) {
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(&next) = edges.get(current) {
            if !seen.insert(current) {
                return Some(start.to_string());
            }
            current = next;
        }
    }
    None
}
