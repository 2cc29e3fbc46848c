//! Employee sign-in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::identity::PayrollId;
use crate::models::BusinessUser;

use super::password::{hash_password, rotation_due, verify_password};
use super::rate_limiter::RateLimiter;

/// Where sign-in looks users up.
pub trait UserDirectory: Send + Sync {
    /// The user with `payroll_id`, if any.
    fn find(&self, payroll_id: &PayrollId) -> EngineResult<Option<BusinessUser>>;

    /// Records a successful sign-in.
    fn record_login(&self, payroll_id: &PayrollId, at: DateTime<Utc>) -> EngineResult<()>;

    /// Replaces the user's password hash.
    fn set_password_hash(
        &self,
        payroll_id: &PayrollId,
        hash: String,
        at: DateTime<Utc>,
    ) -> EngineResult<()>;
}

/// An in-process [`UserDirectory`].
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<PayrollId, BusinessUser>>,
}

fn poisoned<T>(_: PoisonError<T>) -> EngineError {
    EngineError::Storage {
        message: "user directory lock poisoned".to_string(),
    }
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the payroll ID is taken.
    pub fn insert(&self, user: BusinessUser) -> EngineResult<()> {
        let mut users = self.users.lock().map_err(poisoned)?;
        if users.contains_key(&user.payroll_id) {
            return Err(EngineError::Duplicate {
                entity: "user".to_string(),
                id: user.payroll_id.to_string(),
            });
        }
        users.insert(user.payroll_id.clone(), user);
        Ok(())
    }

    fn update(
        &self,
        payroll_id: &PayrollId,
        apply: impl FnOnce(&mut BusinessUser),
    ) -> EngineResult<()> {
        let mut users = self.users.lock().map_err(poisoned)?;
        let user = users.get_mut(payroll_id).ok_or_else(|| EngineError::NotFound {
            entity: "user".to_string(),
            id: payroll_id.to_string(),
        })?;
        apply(user);
        Ok(())
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn find(&self, payroll_id: &PayrollId) -> EngineResult<Option<BusinessUser>> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.get(payroll_id).cloned())
    }

    fn record_login(&self, payroll_id: &PayrollId, at: DateTime<Utc>) -> EngineResult<()> {
        self.update(payroll_id, |user| user.last_login = Some(at))
    }

    fn set_password_hash(
        &self,
        payroll_id: &PayrollId,
        hash: String,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.update(payroll_id, |user| {
            user.password_hash = Some(hash);
            user.password_updated_at = Some(at);
        })
    }
}

/// A successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    /// Who signed in.
    pub payroll_id: PayrollId,
    /// Name to greet the user by.
    pub display_name: String,
    /// The sign-in before this one.
    pub previous_login: Option<DateTime<Utc>>,
    /// Whether the password should be changed now.
    pub password_rotation_due: bool,
}

/// Signs employees in by payroll ID and password.
///
/// Failed attempts are rate limited per payroll ID.
pub struct Authenticator {
    directory: Arc<dyn UserDirectory>,
    limiter: Arc<RateLimiter>,
}

impl Authenticator {
    /// Creates an authenticator.
    pub fn new(directory: Arc<dyn UserDirectory>, limiter: Arc<RateLimiter>) -> Self {
        Self { directory, limiter }
    }

    /// Forgets rate-limit state for payroll IDs that are no longer blocked
    /// and have no recent failures.
    pub fn sweep_rate_limits(&self) {
        self.limiter.cleanup();
    }

    fn reject(&self, key: &str) -> EngineError {
        if self.limiter.record_attempt(key, false) {
            warn!(payroll_id = key, "Sign-in blocked after repeated failures");
        }
        EngineError::AuthenticationFailed
    }

    /// Checks a payroll ID and password.
    ///
    /// # Errors
    ///
    /// * `RateLimited` while the payroll ID is blocked.
    /// * `InvalidId` if the payroll ID is malformed.
    /// * `AuthenticationFailed` for an unknown user or a wrong password. Both
    ///   count towards the block.
    /// * `AccountInactive` if the credentials are right but the user is inactive.
    pub fn authenticate(&self, payroll_id: &str, password: &str) -> EngineResult<AuthOutcome> {
        let key = payroll_id.trim();
        if let Some(wait) = self.limiter.retry_after(key) {
            return Err(EngineError::RateLimited {
                key: key.to_string(),
                retry_after_secs: wait.as_secs().max(1),
            });
        }

        let id = PayrollId::parse(key)?;
        let Some(user) = self.directory.find(&id)? else {
            return Err(self.reject(key));
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(self.reject(key));
        };
        if !verify_password(password, hash)? {
            return Err(self.reject(key));
        }

        if !user.is_active() {
            return Err(EngineError::AccountInactive {
                payroll_id: id.to_string(),
            });
        }

        self.limiter.record_attempt(key, true);
        let now = Utc::now();
        self.directory.record_login(&id, now)?;
        info!(payroll_id = %id, "Signed in");

        Ok(AuthOutcome {
            display_name: user.display_name(),
            previous_login: user.last_login,
            password_rotation_due: user
                .password_updated_at
                .is_none_or(|changed| rotation_due(changed, now)),
            payroll_id: id,
        })
    }

    /// Replaces a password after checking the current one.
    ///
    /// # Errors
    ///
    /// Any error from [`authenticate`](Self::authenticate), or
    /// `PasswordPolicy` if the new password is too weak.
    pub fn change_password(
        &self,
        payroll_id: &str,
        current: &str,
        new_password: &str,
    ) -> EngineResult<()> {
        let outcome = self.authenticate(payroll_id, current)?;
        let hash = hash_password(new_password)?;
        self.directory
            .set_password_hash(&outcome.payroll_id, hash, Utc::now())?;
        info!(payroll_id = %outcome.payroll_id, "Password changed");
        Ok(())
    }
}
