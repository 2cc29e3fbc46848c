//! Password policy and hashing.
//!
//! Hashes are Argon2id PHC strings, which carry their own salt and
//! parameters, so a stored hash verifies even after the parameters change.

use argon2::{
    Algorithm, Argon2, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};

use crate::error::{EngineError, EngineResult};

/// Shortest acceptable password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Days after which a password should be changed.
pub const PASSWORD_ROTATION_DAYS: i64 = 90;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Every policy rule `password` breaks, in a fixed order.
///
/// # Example
///
/// ```
/// use repertoire_engine::security::password_violations;
///
/// assert!(password_violations("Correct#Horse42").is_empty());
/// assert_eq!(password_violations("short").len(), 4);
/// ```
pub fn password_violations(password: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(format!(
            "must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push("must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push("must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("must contain a digit".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push(format!(
            "must contain a special character ({})",
            SPECIAL_CHARACTERS
        ));
    }

    violations
}

/// Checks `password` against the policy.
///
/// # Errors
///
/// Returns `PasswordPolicy` listing every violated rule.
pub fn validate_password(password: &str) -> EngineResult<()> {
    let violations = password_violations(password);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(EngineError::PasswordPolicy { violations })
    }
}

fn hasher() -> EngineResult<Argon2<'static>> {
    let params = ParamsBuilder::new()
        .m_cost(19_456)
        .t_cost(2)
        .p_cost(1)
        .output_len(32)
        .build()
        .map_err(|e| EngineError::PasswordHash {
            message: format!("invalid parameters: {}", e),
        })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password that satisfies the policy.
///
/// # Errors
///
/// Returns `PasswordPolicy` if the password breaks the policy and
/// `PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> EngineResult<String> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| EngineError::PasswordHash {
            message: e.to_string(),
        })?;
    Ok(hash.to_string())
}

/// Whether `password` matches a stored PHC hash.
///
/// # Errors
///
/// Returns `PasswordHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> EngineResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| EngineError::PasswordHash {
        message: format!("stored hash is malformed: {}", e),
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(EngineError::PasswordHash {
            message: e.to_string(),
        }),
    }
}

/// Whether a password last changed at `last_changed` is due for rotation.
pub fn rotation_due(last_changed: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_changed > Duration::days(PASSWORD_ROTATION_DAYS)
}
