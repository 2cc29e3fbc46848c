//! Sign-in, password policy and rate limiting.

mod authenticator;
mod password;
mod rate_limiter;

pub use authenticator::{AuthOutcome, Authenticator, MemoryUserDirectory, UserDirectory};
pub use password::{
    MIN_PASSWORD_LENGTH, PASSWORD_ROTATION_DAYS, hash_password, password_violations, rotation_due,
    validate_password, verify_password,
};
pub use rate_limiter::RateLimiter;
