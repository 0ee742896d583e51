// Service layer
pub mod store;
pub mod tournament_service;


pub use store::Store;
pub use tournament_service::TournamentService;
