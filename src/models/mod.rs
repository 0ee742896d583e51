// Core models
pub mod tournament;
pub mod standings;
pub mod bracket;
pub mod documents;
pub mod requests;

// Re-export commonly used types
pub use tournament::*;
pub use standings::*;
pub use bracket::*;
pub use documents::*;
pub use requests::*;
