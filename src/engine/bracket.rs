//! Elimination bracket seeding.
//!
//! The first round pairs each group winner with the runner-up of the next
//! group (wrapping around), so two competitors from the same group can only
//! meet again later in the bracket. Later rounds are created with empty slots
//! and filled by advancement as results come in.

use thiserror::Error;

use crate::models::{
    round_name, AdvancesTo, BracketRound, Category, GroupStandings, Match, Phase, Seed, Slot,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BracketError {
    #[error("no group reports both a first and a second placer to pair")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeededBracket {
    pub seeds: Vec<Seed>,
    pub rounds: Vec<BracketRound>,
    pub matches: Vec<Match>,
}

/// Top two of every group table, in group order.
fn qualifiers(groups: &[GroupStandings]) -> Vec<(Option<&str>, Option<&str>)> {
    groups.iter().map(|g| (g.first(), g.second())).collect()
}

/// Build the elimination matches for `category` from ranked group tables.
///
/// `next_id` supplies match identifiers; it is called once per created match,
/// first round first.
pub fn seed(
    category: Category,
    groups: &[GroupStandings],
    mut next_id: impl FnMut() -> String,
) -> Result<SeededBracket, BracketError> {
    let top = qualifiers(groups);

    let mut seeds = Vec::new();
    for (i, (first, second)) in top.iter().enumerate() {
        let base = (i as u32) * 2;
        if let Some(first) = first {
            seeds.push(Seed { slot: base + 1, player_id: first.to_string() });
        }
        if let Some(second) = second {
            seeds.push(Seed { slot: base + 2, player_id: second.to_string() });
        }
    }

    let n = top.len();
    let pairs: Vec<(&str, &str)> = (0..n)
        .filter_map(|i| match (top[i].0, top[(i + 1) % n].1) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return Err(BracketError::InsufficientData);
    }

    let mut matches: Vec<Match> = pairs
        .iter()
        .map(|(p1, p2)| Match::scheduled(next_id(), category, Phase::Elimination, *p1, *p2))
        .collect();
    let mut round_indices: Vec<Vec<usize>> = vec![(0..matches.len()).collect()];
    let mut feeders: Vec<usize> = (0..matches.len()).collect();
    let mut contenders: Vec<usize> = vec![2 * pairs.len()];

    while feeders.len() > 1 {
        contenders.push(feeders.len());
        let mut round = Vec::new();
        let mut next_feeders = Vec::new();
        for chunk in feeders.chunks(2) {
            if let &[left, right] = chunk {
                let successor = Match::scheduled(next_id(), category, Phase::Elimination, "", "");
                for (position, feeder) in [left, right].into_iter().enumerate() {
                    matches[feeder].advances_to = Some(AdvancesTo {
                        match_id: successor.id.clone(),
                        slot: Slot::for_feeder(position),
                    });
                }
                round.push(matches.len());
                next_feeders.push(matches.len());
                matches.push(successor);
            } else {
                // Odd feeder out gets a bye into the next pairing.
                next_feeders.extend_from_slice(chunk);
            }
        }
        round_indices.push(round);
        feeders = next_feeders;
    }

    let total = round_indices.len();
    let rounds = round_indices
        .iter()
        .enumerate()
        .map(|(r, indices)| {
            let name = round_name(total - 1 - r, contenders[r]);
            for &i in indices {
                matches[i].round_name = Some(name.clone());
            }
            BracketRound {
                name,
                match_ids: indices.iter().map(|&i| matches[i].id.clone()).collect(),
            }
        })
        .collect();

    Ok(SeededBracket { seeds, rounds, matches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::advancement::find_cycle;
    use crate::models::{MatchStatus, StandingsRow};

    fn table(group_id: &str, players: &[&str]) -> GroupStandings {
        GroupStandings {
            group_id: group_id.to_string(),
            table: players
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let mut row = StandingsRow::new(*p, Some(group_id.to_string()));
                    row.rank = i as u32 + 1;
                    row
                })
                .collect(),
        }
    }

    fn ids() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("me_{}", n)
        }
    }

    fn by_id<'a>(bracket: &'a SeededBracket, id: &str) -> &'a Match {
        bracket.matches.iter().find(|m| m.id == id).unwrap()
    }

    #[test]
    fn test_four_groups_build_quarterfinals_semifinals_final() {
        let groups = vec![
            table("G1", &["a1", "a2", "a3", "a4"]),
            table("G2", &["b1", "b2", "b3", "b4"]),
            table("G3", &["c1", "c2", "c3", "c4"]),
            table("G4", &["d1", "d2", "d3", "d4"]),
        ];
        let bracket = seed(Category::A, &groups, ids()).unwrap();

        let names: Vec<&str> = bracket.rounds.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Quarterfinals", "Semifinals", "Final"]);
        let sizes: Vec<usize> = bracket.rounds.iter().map(|r| r.match_ids.len()).collect();
        assert_eq!(sizes, vec![4, 2, 1]);
        assert_eq!(bracket.matches.len(), 7);

        let qf = &bracket.rounds[0].match_ids;
        let sf = &bracket.rounds[1].match_ids;
        let first_qf = by_id(&bracket, &qf[0]);
        assert_eq!((first_qf.p1.as_str(), first_qf.p2.as_str()), ("a1", "b2"));
        let last_qf = by_id(&bracket, &qf[3]);
        assert_eq!((last_qf.p1.as_str(), last_qf.p2.as_str()), ("d1", "a2"));

        assert_eq!(
            first_qf.advances_to,
            Some(AdvancesTo { match_id: sf[0].clone(), slot: Slot::P1 })
        );
        assert_eq!(
            by_id(&bracket, &qf[1]).advances_to,
            Some(AdvancesTo { match_id: sf[0].clone(), slot: Slot::P2 })
        );
        assert_eq!(
            by_id(&bracket, &qf[2]).advances_to,
            Some(AdvancesTo { match_id: sf[1].clone(), slot: Slot::P1 })
        );

        let final_id = &bracket.rounds[2].match_ids[0];
        assert_eq!(
            by_id(&bracket, &sf[1]).advances_to,
            Some(AdvancesTo { match_id: final_id.clone(), slot: Slot::P2 })
        );
        let final_match = by_id(&bracket, final_id);
        assert!(final_match.advances_to.is_none());
        assert_eq!(final_match.p1, "");
        assert_eq!(final_match.p2, "");
        assert_eq!(find_cycle(&bracket.matches), None);
    }

    #[test]
    fn test_two_groups_feed_semifinals_into_final() {
        let groups = vec![table("G1", &["a1", "a2"]), table("G2", &["b1", "b2"])];
        let bracket = seed(Category::B, &groups, ids()).unwrap();

        let names: Vec<&str> = bracket.rounds.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Semifinals", "Final"]);
        let sf = &bracket.rounds[0].match_ids;
        let final_id = bracket.rounds[1].match_ids[0].clone();
        assert_eq!(by_id(&bracket, &sf[0]).advances_to.as_ref().unwrap().slot, Slot::P1);
        assert_eq!(by_id(&bracket, &sf[1]).advances_to.as_ref().unwrap().slot, Slot::P2);
        assert!(bracket
            .matches
            .iter()
            .filter(|m| m.id != final_id)
            .all(|m| m.advances_to.as_ref().map(|a| &a.match_id) == Some(&final_id)));
    }

    #[test]
    fn test_single_pair_is_a_prefilled_final() {
        let groups = vec![table("G1", &["a1", "a2", "a3"])];
        let bracket = seed(Category::A, &groups, ids()).unwrap();

        assert_eq!(bracket.rounds.len(), 1);
        assert_eq!(bracket.rounds[0].name, "Final");
        assert_eq!(bracket.matches.len(), 1);
        let only = &bracket.matches[0];
        assert_eq!((only.p1.as_str(), only.p2.as_str()), ("a1", "a2"));
        assert_eq!(only.round_name.as_deref(), Some("Final"));
        assert!(only.advances_to.is_none());
    }

    #[test]
    fn test_odd_pair_count_carries_a_bye() {
        let groups = vec![
            table("G1", &["a1", "a2"]),
            table("G2", &["b1", "b2"]),
            table("G3", &["c1", "c2"]),
        ];
        let bracket = seed(Category::A, &groups, ids()).unwrap();

        let sizes: Vec<usize> = bracket.rounds.iter().map(|r| r.match_ids.len()).collect();
        assert_eq!(sizes, vec![3, 1, 1]);
        let qf = &bracket.rounds[0].match_ids;
        let final_id = &bracket.rounds[2].match_ids[0];
        assert_eq!(
            by_id(&bracket, &qf[2]).advances_to,
            Some(AdvancesTo { match_id: final_id.clone(), slot: Slot::P2 })
        );
        assert_eq!(find_cycle(&bracket.matches), None);
    }

    #[test]
    fn test_opening_round_with_byes_is_named_after_its_contenders() {
        let groups = vec![
            table("G1", &["a1", "a2"]),
            table("G2", &["b1", "b2"]),
            table("G3", &["c1", "c2"]),
            table("G4", &["d1", "d2"]),
            table("G5", &["e1", "e2"]),
        ];
        let bracket = seed(Category::A, &groups, ids()).unwrap();

        let sizes: Vec<usize> = bracket.rounds.iter().map(|r| r.match_ids.len()).collect();
        assert_eq!(sizes, vec![5, 2, 1, 1]);
        let names: Vec<&str> = bracket.rounds.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Round of 10", "Quarterfinals", "Semifinals", "Final"]);
        let opener = by_id(&bracket, &bracket.rounds[0].match_ids[0]);
        assert_eq!(opener.round_name.as_deref(), Some("Round of 10"));
    }

    #[test]
    fn test_new_matches_are_scheduled_and_blank() {
        let groups = vec![table("G1", &["a1", "a2"]), table("G2", &["b1", "b2"])];
        let bracket = seed(Category::A, &groups, ids()).unwrap();
        for m in &bracket.matches {
            assert_eq!(m.status, MatchStatus::Scheduled);
            assert_eq!(m.phase, Phase::Elimination);
            assert!(m.winner.is_none());
            assert!(m.sets.iter().all(|s| s.p1 == 0 && s.p2 == 0));
        }
    }

    #[test]
    fn test_seeds_number_group_placers() {
        let groups = vec![table("G1", &["a1", "a2"]), table("G2", &["b1"])];
        let bracket = seed(Category::A, &groups, ids()).unwrap();
        let seeds: Vec<(u32, &str)> =
            bracket.seeds.iter().map(|s| (s.slot, s.player_id.as_str())).collect();
        assert_eq!(seeds, vec![(1, "a1"), (2, "a2"), (3, "b1")]);
        // b1 meets a2; a1 has no runner-up from G2 to face.
        assert_eq!(bracket.matches.len(), 1);
        assert_eq!(bracket.matches[0].p1, "b1");
        assert_eq!(bracket.matches[0].p2, "a2");
    }

    #[test]
    fn test_missing_runner_ups_is_insufficient() {
        let groups = vec![table("G1", &["a1"]), table("G2", &["b1"])];
        assert_eq!(seed(Category::A, &groups, ids()), Err(BracketError::InsufficientData));
        assert_eq!(seed(Category::A, &[], ids()), Err(BracketError::InsufficientData));
    }
}
