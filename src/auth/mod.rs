pub mod identity;
pub mod middleware;

pub use identity::{Claims, Identity, IdentityError, IdentityVerifier, Role};
