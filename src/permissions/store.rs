//! Role assignment storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::context::{PermissionContext, Scope};

/// A role held by a user at one level of the tenant hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The user holding the role.
    pub user_id: String,
    /// The role name, as defined in `scope`.
    pub role: String,
    /// The scope the role is interpreted in.
    pub scope: Scope,
    /// Where the role was assigned.
    pub context: PermissionContext,
    /// Roles inherited through `role` when it was assigned.
    pub inherited_roles: Vec<String>,
    /// Who made the assignment.
    pub assigned_by: Option<String>,
    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
}

/// Storage for role assignments.
///
/// A user holds at most one role per exact context. Resolving roles for a
/// context walks from the system level down to the context itself, so a
/// venue context sees the system, business and venue assignments.
pub trait RoleStore: Send + Sync {
    /// Assignments that apply in `context`, least specific first.
    fn assignments_for(
        &self,
        user_id: &str,
        context: &PermissionContext,
    ) -> EngineResult<Vec<RoleAssignment>>;

    /// Stores an assignment, replacing any role the user held at the same context.
    fn store(&self, assignment: RoleAssignment) -> EngineResult<()>;

    /// Removes the user's role at exactly `context`. Returns false if there was none.
    fn remove(&self, user_id: &str, context: &PermissionContext) -> EngineResult<bool>;
}

/// The contexts whose assignments apply in `context`, least specific first.
///
/// Each step adds one more of the business, venue and work area IDs that
/// `context` carries.
pub fn resolution_chain(context: &PermissionContext) -> Vec<PermissionContext> {
    let mut chain = vec![PermissionContext::default()];
    let mut current = PermissionContext::default();

    if let Some(id) = &context.business_id {
        current.business_id = Some(id.clone());
        chain.push(current.clone());
    }
    if let Some(id) = &context.venue_id {
        current.venue_id = Some(id.clone());
        chain.push(current.clone());
    }
    if let Some(id) = &context.work_area_id {
        current.work_area_id = Some(id.clone());
        chain.push(current);
    }
    chain
}

/// An in-process [`RoleStore`].
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    assignments: Mutex<HashMap<(String, PermissionContext), RoleAssignment>>,
}

impl MemoryRoleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> EngineError {
    EngineError::Storage {
        message: "role store lock poisoned".to_string(),
    }
}

impl RoleStore for MemoryRoleStore {
    fn assignments_for(
        &self,
        user_id: &str,
        context: &PermissionContext,
    ) -> EngineResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.lock().map_err(poisoned)?;
        Ok(resolution_chain(context)
            .into_iter()
            .filter_map(|level| assignments.get(&(user_id.to_string(), level)).cloned())
            .collect())
    }

    fn store(&self, assignment: RoleAssignment) -> EngineResult<()> {
        let mut assignments = self.assignments.lock().map_err(poisoned)?;
        let key = (assignment.user_id.clone(), assignment.context.clone());
        assignments.insert(key, assignment);
        Ok(())
    }

    fn remove(&self, user_id: &str, context: &PermissionContext) -> EngineResult<bool> {
        let mut assignments = self.assignments.lock().map_err(poisoned)?;
        Ok(assignments
            .remove(&(user_id.to_string(), context.clone()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(user_id: &str, role: &str, context: PermissionContext) -> RoleAssignment {
        RoleAssignment {
            user_id: user_id.to_string(),
            role: role.to_string(),
            scope: context.scope(),
            context,
            inherited_roles: Vec::new(),
            assigned_by: None,
            assigned_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolution_chain() {
        let context = PermissionContext::business("CNY-2976")
            .with_venue("VEN-2976-30")
            .with_work_area("WAI-2976-3087");
        let chain = resolution_chain(&context);

        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0], PermissionContext::default());
        assert_eq!(chain[1], PermissionContext::business("CNY-2976"));
        assert_eq!(chain[3], context);
    }

    #[test]
    fn test_assignments_resolve_down_the_hierarchy() {
        let store = MemoryRoleStore::new();
        let business = PermissionContext::business("CNY-2976");
        let venue = business.clone().with_venue("VEN-2976-30");

        store.store(assignment("u1", "manager", business.clone())).unwrap();
        store.store(assignment("u1", "supervisor", venue.clone())).unwrap();
        store
            .store(assignment("u1", "owner", PermissionContext::business("CNY-1111")))
            .unwrap();

        let roles: Vec<String> = store
            .assignments_for("u1", &venue)
            .unwrap()
            .into_iter()
            .map(|a| a.role)
            .collect();
        assert_eq!(roles, vec!["manager", "supervisor"]);

        assert_eq!(store.assignments_for("u1", &business).unwrap().len(), 1);
        assert!(store.assignments_for("u2", &venue).unwrap().is_empty());
    }

    #[test]
    fn test_store_replaces_and_remove_is_exact() {
        let store = MemoryRoleStore::new();
        let business = PermissionContext::business("CNY-2976");

        store.store(assignment("u1", "staff", business.clone())).unwrap();
        store.store(assignment("u1", "admin", business.clone())).unwrap();
        let held = store.assignments_for("u1", &business).unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].role, "admin");

        let venue = business.clone().with_venue("VEN-2976-30");
        assert!(!store.remove("u1", &venue).unwrap());
        assert!(store.remove("u1", &business).unwrap());
        assert!(store.assignments_for("u1", &business).unwrap().is_empty());
    }
}
