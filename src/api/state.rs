//! Application state for the engine API.

use std::sync::Arc;

use crate::config::{ConfigLoader, Settings};
use crate::identity::IdService;
use crate::permissions::{MemoryRoleStore, PermissionManager};
use crate::security::{Authenticator, MemoryUserDirectory, RateLimiter};

/// Shared application state.
///
/// Holds the loaded rule configuration and the in-process services the
/// handlers call. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    ids: Arc<IdService>,
    permissions: Arc<PermissionManager>,
    users: Arc<MemoryUserDirectory>,
    authenticator: Arc<Authenticator>,
}

impl AppState {
    /// Creates state with default settings.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_settings(config, &Settings::default())
    }

    /// Creates state using the cache and login limits from `settings`.
    pub fn with_settings(config: ConfigLoader, settings: &Settings) -> Self {
        let permissions = PermissionManager::from_config(
            config.permissions(),
            Arc::new(MemoryRoleStore::new()),
            settings.permission_cache_ttl,
        );
        let users = Arc::new(MemoryUserDirectory::new());
        let authenticator = Authenticator::new(
            users.clone(),
            Arc::new(RateLimiter::from_settings(settings)),
        );

        Self {
            config: Arc::new(config),
            ids: Arc::new(IdService::in_memory()),
            permissions: Arc::new(permissions),
            users,
            authenticator: Arc::new(authenticator),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// The identifier generator.
    pub fn ids(&self) -> &IdService {
        &self.ids
    }

    /// The permission manager.
    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    /// The users who can sign in.
    pub fn users(&self) -> &MemoryUserDirectory {
        &self.users
    }

    /// The sign-in service.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Drops expired permission cache entries and idle rate-limit keys.
    pub fn sweep_expired(&self) {
        self.permissions.purge_expired();
        self.authenticator.sweep_rate_limits();
    }
}
