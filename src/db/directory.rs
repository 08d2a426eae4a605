//! Durable user records behind the `UserStore` seam.
//!
//! `UserDirectory` is the live Postgres implementation. The trait exists so
//! the orchestration layer can be exercised against a mock store in tests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::models::{NewUser, User};
use crate::error::{DirectoryError, IdentityField};

/// Shared column list so every query hydrates `User` the same way.
const USER_COLUMNS: &str = "id, email, username, password_digest, confirmed, created_at";

/// Store operations the authentication flows depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    /// Persist a new account. Fails with `DuplicateIdentity` when the email
    /// or username is already taken, naming the colliding field.
    async fn create(&self, new_user: NewUser) -> Result<User, DirectoryError>;
}

/// Postgres-backed directory of user accounts.
#[derive(Clone)]
pub struct UserDirectory {
    pool: PgPool,
}

impl UserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every stored account, newest first. Serves the operator listing; not
    /// part of the `UserStore` contract.
    pub async fn list(&self) -> Result<Vec<User>, DirectoryError> {
        let query = format!("SELECT {} FROM users ORDER BY id DESC", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl UserStore for UserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DirectoryError> {
        // Dropping the transaction without commit rolls it back, so every
        // error path below leaves the store untouched.
        let mut tx = self.pool.begin().await.map_err(classify)?;

        // Re-check uniqueness inside the transaction; the unique constraints
        // on the table remain the final authority under concurrent inserts.
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&new_user.email)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?;
        if email_taken {
            return Err(DirectoryError::DuplicateIdentity {
                field: IdentityField::Email,
            });
        }

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&new_user.username)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?;
        if username_taken {
            return Err(DirectoryError::DuplicateIdentity {
                field: IdentityField::Username,
            });
        }

        let query = format!(
            "INSERT INTO users (email, username, password_digest) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_digest)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;
        Ok(user)
    }
}

/// Map a sqlx failure onto the directory taxonomy.
///
/// Unique violations (SQLSTATE 23505) carry the violated constraint's name,
/// which pins down the colliding field. Pool and connection failures are
/// transient and surface as `Unavailable`; everything else is a query fault.
fn classify(err: sqlx::Error) -> DirectoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some("users_email_key") => {
                    return DirectoryError::DuplicateIdentity {
                        field: IdentityField::Email,
                    }
                }
                Some("users_username_key") => {
                    return DirectoryError::DuplicateIdentity {
                        field: IdentityField::Username,
                    }
                }
                _ => {}
            }
        }
        return DirectoryError::Query(err.to_string());
    }

    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DirectoryError::Unavailable(err.to_string())
        }
        other => DirectoryError::Query(other.to_string()),
    }
}
