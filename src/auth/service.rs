//! Registration, credential verification, and token resolution flows.

use tokio::task;
use tracing::{info, warn};

use crate::auth::hasher;
use crate::auth::token::{AccessToken, TokenCodec};
use crate::db::directory::UserStore;
use crate::db::models::{CredentialClaim, NewUser};
use crate::error::{AppError, AuthError, DirectoryError, IdentityField};

/// Ties the user store, the password hasher, and the token codec together.
///
/// Generic over the store so the flows can run against a mock in tests.
pub struct AuthService<S: UserStore> {
    store: S,
    codec: TokenCodec,
    token_ttl_seconds: i64,
}

impl<S: UserStore> AuthService<S> {
    pub fn new(store: S, codec: TokenCodec, token_ttl_seconds: i64) -> Self {
        Self {
            store,
            codec,
            token_ttl_seconds,
        }
    }

    /// Create an account and mint its first session token. Emails are
    /// matched and stored lowercase; only the password digest ever reaches
    /// the store.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AppError> {
        let email = email.trim().to_lowercase();
        let username = username.trim().to_string();

        // Early lookups report the colliding field without burning a digest
        // computation; the store's unique constraints still decide races.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(DirectoryError::DuplicateIdentity {
                field: IdentityField::Email,
            }
            .into());
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(DirectoryError::DuplicateIdentity {
                field: IdentityField::Username,
            }
            .into());
        }

        let password_digest = hash_blocking(password.to_string()).await?;

        let user = self
            .store
            .create(NewUser {
                email,
                username,
                password_digest,
            })
            .await?;
        info!(user_id = user.id, "registered new user");

        let token = self
            .codec
            .issue(&CredentialClaim::from(&user), self.token_ttl_seconds)?;
        Ok(token)
    }

    /// Verify an email + password pair and mint a session token.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AccessToken, AppError> {
        let email = email.trim().to_lowercase();

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("authentication attempt for unknown email");
                return Err(AuthError::NotFound.into());
            }
        };

        let verified = verify_blocking(password.to_string(), user.password_digest.clone()).await?;
        if !verified {
            warn!(user_id = user.id, "authentication attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self
            .codec
            .issue(&CredentialClaim::from(&user), self.token_ttl_seconds)?;
        Ok(token)
    }

    /// Resolve the account claim behind a bearer token.
    ///
    /// Purely cryptographic: the store is never consulted, so resolution
    /// works even while the store is down, and a token stays valid until it
    /// expires.
    pub fn resolve_current_user(&self, token: &str) -> Result<CredentialClaim, AppError> {
        Ok(self.codec.parse(token)?)
    }
}

/// Digest computation is CPU-bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, AppError> {
    task::spawn_blocking(move || hasher::hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_blocking(password: String, digest: String) -> Result<bool, AppError> {
    task::spawn_blocking(move || hasher::verify(&password, &digest))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
        .map_err(AppError::from)
}
