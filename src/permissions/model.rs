//! The role hierarchy per scope.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::{PermissionsConfig, RoleDefinition};

use super::context::Scope;

/// The permission that grants every other permission.
pub const ALL_PERMISSIONS: &str = "all";

/// Roles, their inheritance and their permissions, per scope.
///
/// # Example
///
/// ```
/// use repertoire_engine::config::ConfigLoader;
/// use repertoire_engine::permissions::{PermissionModel, Scope};
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let model = PermissionModel::from_config(config.permissions());
///
/// let roles = model.inherited_roles(Scope::Business, "manager");
/// assert_eq!(roles, vec!["employee".to_string(), "staff".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermissionModel {
    scopes: HashMap<Scope, HashMap<String, RoleDefinition>>,
}

impl PermissionModel {
    /// Builds the model from the loaded permissions file.
    pub fn from_config(config: &PermissionsConfig) -> Self {
        Self {
            scopes: config.scopes.clone(),
        }
    }

    /// Whether `role` is defined in `scope`.
    pub fn has_role(&self, scope: Scope, role: &str) -> bool {
        self.scopes
            .get(&scope)
            .is_some_and(|roles| roles.contains_key(role))
    }

    /// The roles defined in `scope`, sorted.
    pub fn roles(&self, scope: Scope) -> Vec<String> {
        let mut roles: Vec<String> = self
            .scopes
            .get(&scope)
            .map(|roles| roles.keys().cloned().collect())
            .unwrap_or_default();
        roles.sort();
        roles
    }

    /// Every role `role` inherits from, directly or transitively, sorted.
    ///
    /// The role itself is not included. Cycles in the hierarchy are tolerated.
    pub fn inherited_roles(&self, scope: Scope, role: &str) -> Vec<String> {
        let Some(table) = self.scopes.get(&scope) else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::from([role]);
        let mut pending: Vec<&str> = vec![role];
        let mut inherited = BTreeSet::new();

        while let Some(current) = pending.pop() {
            let Some(definition) = table.get(current) else {
                continue;
            };
            for parent in &definition.inherits {
                if seen.insert(parent.as_str()) {
                    inherited.insert(parent.clone());
                    pending.push(parent.as_str());
                }
            }
        }

        inherited.into_iter().collect()
    }

    /// Permissions held by `role` in `scope`, including inherited ones.
    pub fn role_permissions(&self, scope: Scope, role: &str) -> BTreeSet<String> {
        let Some(table) = self.scopes.get(&scope) else {
            return BTreeSet::new();
        };

        std::iter::once(role.to_string())
            .chain(self.inherited_roles(scope, role))
            .filter_map(|r| table.get(&r))
            .flat_map(|definition| definition.permissions.iter().cloned())
            .collect()
    }
}

/// Whether a permission set grants `permission`, directly or through `all`.
pub fn grants(permissions: &BTreeSet<String>, permission: &str) -> bool {
    permissions.contains(permission) || permissions.contains(ALL_PERMISSIONS)
}
