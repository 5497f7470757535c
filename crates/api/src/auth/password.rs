//! Argon2id password hashing and verification.
//!
//! All password hashes use the Argon2id variant with its default (fixed) cost
//! parameters and a cryptographically random salt generated via [`OsRng`].
//! The PHC string format is used for storage so that algorithm parameters and
//! salt are embedded in the hash itself.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Errors from hashing or checking a credential.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The password does not match, or the stored hash is unusable. Callers
    /// see the same variant for both.
    #[error("email or password is incorrect")]
    Mismatch,

    /// The hasher itself failed (e.g. the OS entropy source).
    #[error("password hashing failed: {0}")]
    Hashing(argon2::password_hash::Error),
}

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(CredentialError::Hashing)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), CredentialError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        tracing::debug!(error = %e, "Stored password hash could not be parsed");
        CredentialError::Mismatch
    })?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|e| {
            tracing::debug!(error = %e, "Password verification failed");
            CredentialError::Mismatch
        })
}

/// Check that a password meets the minimum length.
///
/// Returns `Err` with a human-readable explanation when it does not.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "password must be at least {min_length} characters long"
        ));
    }
    Ok(())
}

/// Hash and verify a probe value once.
///
/// Run at startup: if the hasher cannot produce a usable hash here, no signup
/// or login can succeed and the process should not start serving.
pub fn self_test() -> Result<(), CredentialError> {
    const PROBE: &str = "startup-probe";
    let hash = hash_password(PROBE)?;
    verify_password(PROBE, &hash)
}
