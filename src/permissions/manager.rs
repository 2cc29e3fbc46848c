//! Permission checks with cached decisions.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::PermissionsConfig;
use crate::error::{EngineError, EngineResult};

use super::cache::TtlCache;
use super::context::{PermissionContext, Scope};
use super::model::{PermissionModel, grants};
use super::store::{RoleAssignment, RoleStore};

/// Default lifetime of cached decisions and role lookups.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Checks and manages user permissions across the tenant hierarchy.
///
/// A user's roles in a context are every role assigned at the system level,
/// the business, the venue and the work area named by the context. Each role
/// is read in its own scope's table, and the user holds the union of their
/// permissions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use repertoire_engine::config::ConfigLoader;
/// use repertoire_engine::permissions::{MemoryRoleStore, PermissionContext, PermissionManager};
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let manager = PermissionManager::from_config(
///     config.permissions(),
///     Arc::new(MemoryRoleStore::new()),
///     std::time::Duration::from_secs(300),
/// );
///
/// let context = PermissionContext::business("CNY-2976");
/// manager.assign_role("u1", "manager", &context, Some("owner-1")).unwrap();
/// assert!(manager.check_permission("u1", "view_reports", &context).unwrap());
/// assert!(!manager.check_permission("u1", "manage_settings", &context).unwrap());
/// ```
pub struct PermissionManager {
    model: PermissionModel,
    store: Arc<dyn RoleStore>,
    decisions: TtlCache<DecisionKey, bool>,
    roles: TtlCache<RolesKey, Vec<(Scope, String)>>,
}

/// User, permission and context of a cached decision.
type DecisionKey = (String, String, PermissionContext);

/// User and context of a cached role lookup.
type RolesKey = (String, PermissionContext);

impl PermissionManager {
    /// Creates a manager over a role model and store.
    pub fn new(model: PermissionModel, store: Arc<dyn RoleStore>, cache_ttl: Duration) -> Self {
        Self {
            model,
            store,
            decisions: TtlCache::new(cache_ttl),
            roles: TtlCache::new(cache_ttl),
        }
    }

    /// Creates a manager from the loaded permissions file.
    pub fn from_config(
        config: &PermissionsConfig,
        store: Arc<dyn RoleStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self::new(PermissionModel::from_config(config), store, cache_ttl)
    }

    /// The role model.
    pub fn model(&self) -> &PermissionModel {
        &self.model
    }

    fn decision_key(user_id: &str, permission: &str, context: &PermissionContext) -> DecisionKey {
        (user_id.to_string(), permission.to_string(), context.clone())
    }

    fn roles_key(user_id: &str, context: &PermissionContext) -> RolesKey {
        (user_id.to_string(), context.clone())
    }

    fn user_roles(
        &self,
        user_id: &str,
        context: &PermissionContext,
    ) -> EngineResult<Vec<(Scope, String)>> {
        let key = Self::roles_key(user_id, context);
        if let Some(roles) = self.roles.get(&key) {
            return Ok(roles);
        }

        let roles: Vec<(Scope, String)> = self
            .store
            .assignments_for(user_id, context)?
            .into_iter()
            .map(|assignment| (assignment.scope, assignment.role))
            .collect();
        self.roles.insert(key, roles.clone());
        Ok(roles)
    }

    /// Every permission the user holds in `context`, inherited ones included.
    pub fn effective_permissions(
        &self,
        user_id: &str,
        context: &PermissionContext,
    ) -> EngineResult<BTreeSet<String>> {
        if user_id.is_empty() {
            return Ok(BTreeSet::new());
        }

        Ok(self
            .user_roles(user_id, context)?
            .iter()
            .flat_map(|(scope, role)| self.model.role_permissions(*scope, role))
            .collect())
    }

    /// Whether the user holds `permission` in `context`.
    ///
    /// An empty user ID never holds anything. Decisions are cached per user,
    /// permission and context.
    pub fn check_permission(
        &self,
        user_id: &str,
        permission: &str,
        context: &PermissionContext,
    ) -> EngineResult<bool> {
        if user_id.is_empty() {
            return Ok(false);
        }

        let key = Self::decision_key(user_id, permission, context);
        if let Some(allowed) = self.decisions.get(&key) {
            return Ok(allowed);
        }

        debug!(user_id, permission, context = %context.describe(), "Permission cache miss");
        let allowed = grants(&self.effective_permissions(user_id, context)?, permission);
        self.decisions.insert(key, allowed);
        Ok(allowed)
    }

    /// Like [`check_permission`](Self::check_permission), but a refusal is an error.
    pub fn require_permission(
        &self,
        user_id: &str,
        permission: &str,
        context: &PermissionContext,
    ) -> EngineResult<()> {
        if self.check_permission(user_id, permission, context)? {
            Ok(())
        } else {
            warn!(user_id, permission, "Permission denied");
            Err(EngineError::PermissionDenied {
                user_id: user_id.to_string(),
                permission: permission.to_string(),
            })
        }
    }

    /// Gives the user `role` at `context`, replacing any role held there.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRole` if the role is not defined for the context's
    /// scope, and `Validation` for an empty user ID.
    pub fn assign_role(
        &self,
        user_id: &str,
        role: &str,
        context: &PermissionContext,
        assigned_by: Option<&str>,
    ) -> EngineResult<RoleAssignment> {
        if user_id.is_empty() {
            return Err(EngineError::validation("user_id", "cannot be empty"));
        }

        let scope = context.scope();
        if !self.model.has_role(scope, role) {
            return Err(EngineError::InvalidRole {
                role: role.to_string(),
                scope: scope.to_string(),
            });
        }

        let assignment = RoleAssignment {
            user_id: user_id.to_string(),
            role: role.to_string(),
            scope,
            context: context.clone(),
            inherited_roles: self.model.inherited_roles(scope, role),
            assigned_by: assigned_by.map(str::to_string),
            assigned_at: Utc::now(),
        };
        self.store.store(assignment.clone())?;
        self.clear_user_cache(user_id);

        info!(user_id, role, %scope, assigned_by = ?assigned_by, "Role assigned");
        Ok(assignment)
    }

    /// Removes the user's role at exactly `context`.
    ///
    /// Returns false if the user held no role there.
    pub fn remove_role(&self, user_id: &str, context: &PermissionContext) -> EngineResult<bool> {
        let removed = self.store.remove(user_id, context)?;
        if removed {
            self.clear_user_cache(user_id);
            info!(user_id, context = %context.describe(), "Role removed");
        }
        Ok(removed)
    }

    fn clear_user_cache(&self, user_id: &str) {
        self.decisions.retain(|(user, _, _)| user.as_str() != user_id);
        self.roles.retain(|(user, _)| user.as_str() != user_id);
    }

    /// Drops every cached decision and role lookup.
    pub fn cleanup(&self) {
        self.decisions.clear();
        self.roles.clear();
    }

    /// Drops cached decisions and role lookups that have expired.
    pub fn purge_expired(&self) {
        self.decisions.purge_expired();
        self.roles.purge_expired();
    }

    /// Cached decisions currently held.
    pub fn cached_decisions(&self) -> usize {
        self.decisions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::permissions::MemoryRoleStore;

    fn manager() -> PermissionManager {
        let config = ConfigLoader::load("./config/au").unwrap();
        PermissionManager::from_config(
            config.permissions(),
            Arc::new(MemoryRoleStore::new()),
            DEFAULT_CACHE_TTL,
        )
    }

    fn venue() -> PermissionContext {
        PermissionContext::business("CNY-2976").with_venue("VEN-2976-30")
    }

    #[test]
    fn test_empty_user_is_denied() {
        let manager = manager();
        assert!(!manager.check_permission("", "view_own_tasks", &venue()).unwrap());
        assert!(manager.effective_permissions("", &venue()).unwrap().is_empty());
    }

    #[test]
    fn test_venue_role_inherits() {
        let manager = manager();
        manager.assign_role("u1", "supervisor", &venue(), None).unwrap();

        assert!(manager.check_permission("u1", "view_staff", &venue()).unwrap());
        assert!(manager.check_permission("u1", "update_own_status", &venue()).unwrap());
        assert!(!manager.check_permission("u1", "manage_venue", &venue()).unwrap());
        // Venue roles do not reach up to the business.
        let business = PermissionContext::business("CNY-2976");
        assert!(!manager.check_permission("u1", "view_staff", &business).unwrap());
    }

    #[test]
    fn test_business_role_applies_at_its_venues() {
        let manager = manager();
        let business = PermissionContext::business("CNY-2976");
        manager.assign_role("u1", "manager", &business, None).unwrap();
        manager.assign_role("u1", "employee", &venue(), None).unwrap();

        let permissions = manager.effective_permissions("u1", &venue()).unwrap();
        assert!(permissions.contains("create_orders"));
        assert!(permissions.contains("view_own_tasks"));
        assert!(permissions.contains("view_own_schedule"));
    }

    #[test]
    fn test_owner_holds_all() {
        let manager = manager();
        let business = PermissionContext::business("CNY-2976");
        manager.assign_role("u1", "owner", &business, None).unwrap();
        assert!(manager.check_permission("u1", "anything_at_all", &business).unwrap());
        assert!(manager.check_permission("u1", "anything_at_all", &venue()).unwrap());
    }

    #[test]
    fn test_invalid_role_for_scope() {
        let manager = manager();
        match manager.assign_role("u1", "venue_manager", &PermissionContext::business("CNY-2976"), None) {
            Err(EngineError::InvalidRole { role, scope }) => {
                assert_eq!(role, "venue_manager");
                assert_eq!(scope, "business");
            }
            other => panic!("Expected InvalidRole, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_records_inheritance() {
        let manager = manager();
        let assignment = manager
            .assign_role("u1", "staff", &venue(), Some("admin-7"))
            .unwrap();
        assert_eq!(assignment.scope, Scope::Venue);
        assert_eq!(assignment.inherited_roles, vec!["employee"]);
        assert_eq!(assignment.assigned_by.as_deref(), Some("admin-7"));
    }

    #[test]
    fn test_assign_and_remove_invalidate_cache() {
        let manager = manager();
        assert!(!manager.check_permission("u1", "view_own_tasks", &venue()).unwrap());
        assert_eq!(manager.cached_decisions(), 1);

        manager.assign_role("u1", "employee", &venue(), None).unwrap();
        assert_eq!(manager.cached_decisions(), 0);
        assert!(manager.check_permission("u1", "view_own_tasks", &venue()).unwrap());

        assert!(manager.remove_role("u1", &venue()).unwrap());
        assert!(!manager.check_permission("u1", "view_own_tasks", &venue()).unwrap());
        assert!(!manager.remove_role("u1", &venue()).unwrap());
    }

    #[test]
    fn test_other_users_cache_survives() {
        let manager = manager();
        manager.check_permission("u10", "view_own_tasks", &venue()).unwrap();
        manager.assign_role("u1", "employee", &venue(), None).unwrap();
        assert_eq!(manager.cached_decisions(), 1);

        manager.cleanup();
        assert_eq!(manager.cached_decisions(), 0);
    }

    #[test]
    fn test_separator_in_ids_does_not_share_decisions() {
        let manager = manager();
        let business = PermissionContext::business("CNY-2976");
        manager.assign_role("bob", "owner", &business, None).unwrap();
        assert!(manager.check_permission("bob", "x:y", &business).unwrap());

        assert!(manager.effective_permissions("bob:x", &business).unwrap().is_empty());
        assert!(!manager.check_permission("bob:x", "y", &business).unwrap());
    }

    #[test]
    fn test_business_id_cannot_pose_as_venue() {
        let manager = manager();
        manager.assign_role("u1", "supervisor", &venue(), None).unwrap();
        assert!(manager.check_permission("u1", "view_staff", &venue()).unwrap());

        let forged = PermissionContext::business("CNY-2976:venue_id=VEN-2976-30");
        assert!(!manager.check_permission("u1", "view_staff", &forged).unwrap());
    }

    #[test]
    fn test_role_change_keeps_prefix_sharing_users_cached() {
        let manager = manager();
        manager.check_permission("bob:x", "view_own_tasks", &venue()).unwrap();
        manager.assign_role("bob", "employee", &venue(), None).unwrap();
        assert_eq!(manager.cached_decisions(), 1);
    }

    #[test]
    fn test_require_permission() {
        let manager = manager();
        manager.assign_role("u1", "employee", &venue(), None).unwrap();
        assert!(manager.require_permission("u1", "view_own_tasks", &venue()).is_ok());
        assert!(matches!(
            manager.require_permission("u1", "manage_venue", &venue()),
            Err(EngineError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_system_role_applies_everywhere() {
        let manager = manager();
        manager
            .assign_role("root", "super_admin", &PermissionContext::default(), None)
            .unwrap();
        assert!(manager.check_permission("root", "manage_venue", &venue()).unwrap());
    }
}
