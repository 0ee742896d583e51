// Tournament progression rules. Everything in here is pure: no I/O, no clock.
pub mod scoring;
pub mod standings;
pub mod bracket;
pub mod advancement;

pub use scoring::{evaluate, normalize_sets, valid_set_wins, ScoreError};
pub use standings::{compute as compute_standings, ComputedStandings};
pub use bracket::{seed as seed_bracket, BracketError, SeededBracket};
pub use advancement::{find_cycle, propagate, Propagation};
