//! Failed-attempt rate limiting.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Settings;

/// Key count below which recording never sweeps.
const MIN_SWEEP_LEN: usize = 64;

#[derive(Debug, Default)]
struct KeyState {
    attempts: Vec<Instant>,
    blocked_until: Option<Instant>,
}

impl KeyState {
    fn prune(&mut self, now: Instant, window: Duration) {
        self.attempts
            .retain(|at| now.saturating_duration_since(*at) < window);
    }

    /// Whether the key holds no block and no attempt inside the window.
    fn is_idle(&mut self, now: Instant, window: Duration) -> bool {
        if self.blocked_until.is_some_and(|until| until > now) {
            return false;
        }
        self.blocked_until = None;
        self.prune(now, window);
        self.attempts.is_empty()
    }
}

#[derive(Debug)]
struct Keys {
    states: HashMap<String, KeyState>,
    sweep_at: usize,
}

/// Blocks a key after too many failed attempts within a window.
///
/// Keys are arbitrary strings, usually a payroll ID or a client address.
/// Once `max_attempts` failures fall inside `window`, the key is blocked for
/// `block`. A successful attempt clears the key's history. Recording sweeps
/// idle keys once the key count has doubled since the last sweep.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use repertoire_engine::security::RateLimiter;
///
/// let limiter = RateLimiter::new(2, Duration::from_secs(300), Duration::from_secs(900));
/// limiter.record_attempt("DK-100001", false);
/// assert_eq!(limiter.remaining_attempts("DK-100001"), 1);
/// limiter.record_attempt("DK-100001", false);
/// assert!(limiter.is_blocked("DK-100001"));
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    block: Duration,
    keys: Mutex<Keys>,
}

impl RateLimiter {
    /// Creates a limiter.
    pub fn new(max_attempts: u32, window: Duration, block: Duration) -> Self {
        Self {
            max_attempts,
            window,
            block,
            keys: Mutex::new(Keys {
                states: HashMap::new(),
                sweep_at: MIN_SWEEP_LEN,
            }),
        }
    }

    /// Creates a limiter from the login settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.login_max_attempts,
            settings.login_window,
            settings.login_block,
        )
    }

    fn keys(&self) -> MutexGuard<'_, Keys> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `key` is currently blocked.
    pub fn is_blocked(&self, key: &str) -> bool {
        self.retry_after_at(key, Instant::now()).is_some()
    }

    /// Time left on the block for `key`, if it is blocked.
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        self.retry_after_at(key, Instant::now())
    }

    fn retry_after_at(&self, key: &str, now: Instant) -> Option<Duration> {
        let mut keys = self.keys();
        let blocked_until = keys.states.get(key)?.blocked_until;
        match blocked_until {
            Some(until) if until > now => Some(until - now),
            Some(_) => {
                keys.states.remove(key);
                info!(key, "Rate limit block expired");
                None
            }
            None => None,
        }
    }

    /// Records an attempt for `key` and returns whether the key is now blocked.
    ///
    /// A success clears the key's history.
    pub fn record_attempt(&self, key: &str, success: bool) -> bool {
        self.record_attempt_at(key, success, Instant::now())
    }

    fn record_attempt_at(&self, key: &str, success: bool, now: Instant) -> bool {
        let mut keys = self.keys();
        if success {
            keys.states.remove(key);
            return false;
        }

        if keys.states.len() >= keys.sweep_at {
            let window = self.window;
            keys.states.retain(|_, state| !state.is_idle(now, window));
            keys.sweep_at = (keys.states.len() * 2).max(MIN_SWEEP_LEN);
        }

        let state = keys.states.entry(key.to_string()).or_default();
        if state.blocked_until.is_some_and(|until| until > now) {
            return true;
        }
        state.blocked_until = None;
        state.prune(now, self.window);
        state.attempts.push(now);

        if state.attempts.len() >= self.max_attempts as usize {
            state.blocked_until = Some(now + self.block);
            warn!(
                key,
                attempts = state.attempts.len(),
                block_secs = self.block.as_secs(),
                "Too many failed attempts; key blocked"
            );
            return true;
        }
        false
    }

    /// Failures `key` may still make before being blocked.
    pub fn remaining_attempts(&self, key: &str) -> u32 {
        self.remaining_attempts_at(key, Instant::now())
    }

    fn remaining_attempts_at(&self, key: &str, now: Instant) -> u32 {
        if self.retry_after_at(key, now).is_some() {
            return 0;
        }
        let mut keys = self.keys();
        let used = keys.states.get_mut(key).map_or(0, |state| {
            state.prune(now, self.window);
            state.attempts.len()
        });
        self.max_attempts
            .saturating_sub(u32::try_from(used).unwrap_or(u32::MAX))
    }

    /// Forgets every attempt and any block for `key`.
    pub fn clear_attempts(&self, key: &str) {
        self.keys().states.remove(key);
    }

    /// Forgets keys whose block has lapsed and whose attempts have all left
    /// the window.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        let mut keys = self.keys();
        let before = keys.states.len();
        let window = self.window;
        keys.states.retain(|_, state| !state.is_idle(now, window));
        let removed = before - keys.states.len();
        if removed > 0 {
            debug!(removed, "Rate limiter keys swept");
        }
    }

    /// Keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.keys().states.len()
    }
}
