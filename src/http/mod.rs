pub mod health;
pub mod tournament_handler;

pub use tournament_handler::{configure_routes, AppState};
