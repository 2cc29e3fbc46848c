//! Permission scopes and the context a check is made in.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The level of the tenant hierarchy a role applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Platform-wide roles.
    System,
    /// Roles within one business (company).
    Business,
    /// Roles within one venue or one of its work areas.
    Venue,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::System => "system",
            Scope::Business => "business",
            Scope::Venue => "venue",
        })
    }
}

/// Where a permission is being exercised.
///
/// The most specific identifier present decides the scope: a work area or
/// venue means venue scope, a business alone means business scope, and an
/// empty context is system scope.
///
/// # Example
///
/// ```
/// use repertoire_engine::permissions::{PermissionContext, Scope};
///
/// let context = PermissionContext::business("CNY-2976").with_venue("VEN-2976-30");
/// assert_eq!(context.scope(), Scope::Venue);
/// assert_eq!(PermissionContext::default().scope(), Scope::System);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionContext {
    /// The business (company) ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    /// The venue ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_id: Option<String>,
    /// The work area ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_area_id: Option<String>,
}

impl PermissionContext {
    /// A context within a business.
    pub fn business(business_id: impl Into<String>) -> Self {
        Self {
            business_id: Some(business_id.into()),
            ..Self::default()
        }
    }

    /// Adds a venue to the context.
    pub fn with_venue(mut self, venue_id: impl Into<String>) -> Self {
        self.venue_id = Some(venue_id.into());
        self
    }

    /// Adds a work area to the context.
    pub fn with_work_area(mut self, work_area_id: impl Into<String>) -> Self {
        self.work_area_id = Some(work_area_id.into());
        self
    }

    /// The scope this context resolves to.
    pub fn scope(&self) -> Scope {
        if self.work_area_id.is_some() || self.venue_id.is_some() {
            Scope::Venue
        } else if self.business_id.is_some() {
            Scope::Business
        } else {
            Scope::System
        }
    }

    /// The context's fields as sorted `key=value` pairs.
    pub fn entries(&self) -> BTreeMap<&'static str, &str> {
        let mut entries = BTreeMap::new();
        if let Some(id) = &self.business_id {
            entries.insert("business_id", id.as_str());
        }
        if let Some(id) = &self.venue_id {
            entries.insert("venue_id", id.as_str());
        }
        if let Some(id) = &self.work_area_id {
            entries.insert("work_area_id", id.as_str());
        }
        entries
    }

    /// The context as `key=value` pairs joined by `,`, for log fields.
    pub fn describe(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(",")
    }
}
