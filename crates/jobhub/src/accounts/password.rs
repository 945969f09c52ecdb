use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

pub(crate) fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| PasswordError::Hashing(err.to_string()))?;

    Ok(hash.to_string())
}

pub(crate) fn verify_password(hash: &str, password: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| PasswordError::MalformedHash(err.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn decoy_hash() -> Option<&'static str> {
    DECOY_HASH
        .get_or_init(|| hash_password("decoy-passphrase-0").ok())
        .as_deref()
}

/// Spends one verification on a throwaway hash so a miss on the account
/// lookup costs as much as a wrong password.
pub(crate) fn verify_decoy(password: &str) {
    if let Some(hash) = decoy_hash() {
        let _ = verify_password(hash, password);
    }
}
