use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persistent identity record. The id is assigned by the store on insert and
/// never changes; `confirmed` is flipped by the (out-of-scope) confirmation
/// flow and defaults to false.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_digest: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for a directory insert. The digest is already hashed; raw passwords
/// never reach the directory.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_digest: String,
}

/// The user projection embedded in tokens and returned to callers.
/// Deliberately excludes the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaim {
    pub id: i64,
    pub email: String,
    pub username: String,
}

impl From<&User> for CredentialClaim {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Public listing projection for the utilities endpoint. No ids, no digest.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}
