//! One-way salted password hashing.
//!
//! bcrypt is deliberately slow, so both operations move onto tokio's blocking pool
//! instead of stalling a runtime worker.

use crate::{error::AppError, validation::MAX_PASSWORD_BYTES};

/// Work factor applied to every new hash.
pub const HASH_COST: u32 = 10;

/// Refuses input bcrypt would truncate, so no two distinct passwords share a hash.
pub async fn hash_password(plain: &str) -> Result<String, AppError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(
            "password: must be between 1 and 72 bytes".to_string(),
        ));
    }
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, HASH_COST))
        .await
        .map_err(|e| AppError::Server(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Server(format!("password hashing failed: {e}")))
}

/// True when `plain` matches `hash`. A malformed stored hash counts as a mismatch, and so
/// does input longer than any password that could have been stored.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| AppError::Server(format!("verification task failed: {e}")))?;

    match matched {
        Ok(matched) => Ok(matched),
        Err(e) => {
            tracing::warn!("stored password hash could not be checked: {e}");
            Ok(false)
        }
    }
}
