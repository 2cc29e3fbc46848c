//! Roles and permissions across the tenant hierarchy.
//!
//! Roles are defined per [`Scope`] in `permissions.yaml`. A role may inherit
//! other roles of the same scope, and the `all` permission grants everything.
//! [`PermissionManager`] resolves a user's roles for a [`PermissionContext`]
//! through a [`RoleStore`] and caches its decisions for a fixed time.

mod cache;
mod context;
mod manager;
mod model;
mod store;

pub use cache::TtlCache;
pub use context::{PermissionContext, Scope};
pub use manager::{DEFAULT_CACHE_TTL, PermissionManager};
pub use model::{ALL_PERMISSIONS, PermissionModel, grants};
pub use store::{MemoryRoleStore, RoleAssignment, RoleStore, resolution_chain};
