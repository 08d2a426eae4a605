//! Argon2id password hashing and verification.
//!
//! Digests use the PHC string format, so algorithm, parameters, and salt are
//! embedded in the digest itself and stored digests keep verifying after cost
//! parameters change.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::HasherError;

/// Hash a raw password with a fresh random salt.
///
/// Returns the PHC-formatted digest string. The password must be non-empty.
pub fn hash(raw_password: &str) -> Result<String, HasherError> {
    if raw_password.is_empty() {
        return Err(HasherError::EmptyPassword);
    }
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|e| HasherError::Hashing(e.to_string()))?;
    Ok(digest.to_string())
}

/// Verify a raw password against a stored PHC digest.
///
/// Comparison is constant-time inside the argon2 crate. A mismatch is
/// `Ok(false)`, never an error; only a digest that cannot be parsed (or names
/// parameters we cannot run) errors.
pub fn verify(raw_password: &str, digest: &str) -> Result<bool, HasherError> {
    let parsed = PasswordHash::new(digest).map_err(|e| HasherError::MalformedDigest(e.to_string()))?;
    match Argon2::default().verify_password(raw_password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HasherError::MalformedDigest(e.to_string())),
    }
}
