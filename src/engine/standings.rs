//! Group-stage standings.
//!
//! Standings are always rebuilt from the full match list so that late score
//! corrections are picked up without any incremental bookkeeping.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Competitor, Group, GroupStandings, Match, Slot, StandingsRow};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputedStandings {
    pub overall: Vec<StandingsRow>,
    pub groups: Vec<GroupStandings>,
}

/// Rank every registered competitor from the finished matches.
///
/// Registered competitors are the category's players followed by any group
/// member not already listed, in first-seen order. That order is the input
/// order the stable sort falls back to when two rows compare equal.
pub fn compute(competitors: &[Competitor], groups: &[Group], matches: &[Match]) -> ComputedStandings {
    let mut rows: Vec<StandingsRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let registered = competitors
        .iter()
        .map(|c| c.id.as_str())
        .chain(groups.iter().flat_map(|g| g.players.iter().map(String::as_str)));
    for player_id in registered {
        if player_id.is_empty() || index.contains_key(player_id) {
            continue;
        }
        let group_id = groups.iter().find(|g| g.contains(player_id)).map(|g| g.id.clone());
        index.insert(player_id.to_string(), rows.len());
        rows.push(StandingsRow::new(player_id, group_id));
    }

    for m in matches.iter().filter(|m| m.is_final()) {
        let (Some(&i1), Some(&i2)) = (index.get(&m.p1), index.get(&m.p2)) else {
            continue;
        };
        if i1 == i2 {
            continue;
        }
        accumulate(&mut rows, i1, i2, m);
    }

    for row in &mut rows {
        finish_row(row);
    }
    rows.sort_by(compare_rows);
    assign_ranks(&mut rows);

    let groups = groups
        .iter()
        .map(|group| {
            let mut table: Vec<StandingsRow> = rows
                .iter()
                .filter(|row| group.contains(&row.player_id))
                .cloned()
                .map(|mut row| {
                    row.group_id = Some(group.id.clone());
                    row
                })
                .collect();
            assign_ranks(&mut table);
            GroupStandings {
                group_id: group.id.clone(),
                table,
            }
        })
        .collect();

    ComputedStandings { overall: rows, groups }
}

fn accumulate(rows: &mut [StandingsRow], i1: usize, i2: usize, m: &Match) {
    let (mut sets1, mut sets2, mut points1, mut points2) = (0, 0, 0, 0);
    for set in &m.sets {
        points1 += set.p1;
        points2 += set.p2;
        match set.taken_by() {
            Some(Slot::P1) => sets1 += 1,
            Some(Slot::P2) => sets2 += 1,
            None => {}
        }
    }

    let decided = match m.winner.as_deref() {
        Some(w) if w == m.p1 => Some(Slot::P1),
        Some(w) if w == m.p2 => Some(Slot::P2),
        _ => None,
    };

    for (i, slot, sets_won, sets_lost, points_won, points_lost) in [
        (i1, Slot::P1, sets1, sets2, points1, points2),
        (i2, Slot::P2, sets2, sets1, points2, points1),
    ] {
        let row = &mut rows[i];
        row.matches_played += 1;
        row.sets_won += sets_won;
        row.sets_lost += sets_lost;
        row.points_won += points_won;
        row.points_lost += points_lost;
        match decided {
            Some(winner) if winner == slot => row.wins += 1,
            Some(_) => row.losses += 1,
            None => {}
        }
    }
}

fn finish_row(row: &mut StandingsRow) {
    row.set_difference = i64::from(row.sets_won) - i64::from(row.sets_lost);
    row.point_difference = i64::from(row.points_won) - i64::from(row.points_lost);
    row.win_percentage = if row.matches_played == 0 {
        0.0
    } else {
        round3(f64::from(row.wins) / f64::from(row.matches_played))
    };
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Descending by wins, set difference, point difference, win percentage.
/// Equal rows compare `Equal`, which the stable sort resolves by input order.
pub fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.set_difference.cmp(&a.set_difference))
        .then_with(|| b.point_difference.cmp(&a.point_difference))
        .then_with(|| b.win_percentage.total_cmp(&a.win_percentage))
}

fn assign_ranks(rows: &mut [StandingsRow]) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = (i + 1) as u32;
    }
}
