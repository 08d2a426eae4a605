//! Database module
//!
//! Connection handling, user records, and the directory access layer.

pub mod directory;
pub mod models;

pub use directory::{UserDirectory, UserStore};
pub use models::{CredentialClaim, NewUser, User, UserSummary};
