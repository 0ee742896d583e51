use serde::{Deserialize, Serialize};

/// Display-only record of which competitor occupies a numbered seed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub slot: u32,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BracketRound {
    pub name: String,
    pub match_ids: Vec<String>,
}

/// Round name counted back from the last round of the bracket. Rounds before
/// the quarterfinals are named after the competitors still in contention,
/// byes included.
pub fn round_name(rounds_after: usize, contenders: usize) -> String {
    match rounds_after {
        0 => "Final".to_string(),
        1 => "Semifinals".to_string(),
        2 => "Quarterfinals".to_string(),
        _ => format!("Round of {}", contenders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_names() {
        assert_eq!(round_name(0, 2), "Final");
        assert_eq!(round_name(1, 4), "Semifinals");
        assert_eq!(round_name(2, 6), "Quarterfinals");
        assert_eq!(round_name(3, 16), "Round of 16");
        assert_eq!(round_name(3, 10), "Round of 10");
    }
}
