//! The fixed vocabulary of work areas and their single-letter payroll codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A named area of a venue that staff are assigned to.
///
/// Each work area has a single upper-case letter code which prefixes the
/// payroll IDs of staff in that area (`DK-100001` for kitchen staff).
///
/// # Example
///
/// ```
/// use repertoire_engine::models::WorkAreaKind;
///
/// let area: WorkAreaKind = "Guest Services".parse().unwrap();
/// assert_eq!(area.code(), 'G');
/// assert_eq!(WorkAreaKind::from_code('K'), Some(WorkAreaKind::Kitchen));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WorkAreaKind {
    /// Administration.
    Admin,
    /// Bar.
    Bar,
    /// Cleaners.
    Cleaners,
    /// Functions and events.
    Functions,
    /// Guest services.
    GuestServices,
    /// House keeping.
    HouseKeeping,
    /// Kitchen.
    Kitchen,
    /// Maintenance.
    Maintenance,
    /// Operations.
    Operations,
    /// Restaurant.
    Restaurant,
    /// Store room.
    StoreRoom,
    /// The venue itself. Every venue has one.
    Venue,
}

impl WorkAreaKind {
    /// Every work area in code order.
    pub const ALL: [WorkAreaKind; 12] = [
        WorkAreaKind::Admin,
        WorkAreaKind::Bar,
        WorkAreaKind::Cleaners,
        WorkAreaKind::Functions,
        WorkAreaKind::GuestServices,
        WorkAreaKind::HouseKeeping,
        WorkAreaKind::Kitchen,
        WorkAreaKind::Maintenance,
        WorkAreaKind::Operations,
        WorkAreaKind::Restaurant,
        WorkAreaKind::StoreRoom,
        WorkAreaKind::Venue,
    ];

    /// The canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            WorkAreaKind::Admin => "admin",
            WorkAreaKind::Bar => "bar",
            WorkAreaKind::Cleaners => "cleaners",
            WorkAreaKind::Functions => "functions",
            WorkAreaKind::GuestServices => "guest services",
            WorkAreaKind::HouseKeeping => "house keeping",
            WorkAreaKind::Kitchen => "kitchen",
            WorkAreaKind::Maintenance => "maintenance",
            WorkAreaKind::Operations => "operations",
            WorkAreaKind::Restaurant => "restaurant",
            WorkAreaKind::StoreRoom => "store room",
            WorkAreaKind::Venue => "venue",
        }
    }

    /// The payroll code letter.
    pub fn code(&self) -> char {
        match self {
            WorkAreaKind::Admin => 'A',
            WorkAreaKind::Bar => 'B',
            WorkAreaKind::Cleaners => 'C',
            WorkAreaKind::Functions => 'F',
            WorkAreaKind::GuestServices => 'G',
            WorkAreaKind::HouseKeeping => 'H',
            WorkAreaKind::Kitchen => 'K',
            WorkAreaKind::Maintenance => 'M',
            WorkAreaKind::Operations => 'O',
            WorkAreaKind::Restaurant => 'R',
            WorkAreaKind::StoreRoom => 'S',
            WorkAreaKind::Venue => 'V',
        }
    }

    /// Looks up a work area by its payroll code letter.
    pub fn from_code(code: char) -> Option<WorkAreaKind> {
        WorkAreaKind::ALL.into_iter().find(|area| area.code() == code)
    }
}

impl fmt::Display for WorkAreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkAreaKind {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let normalized = s.trim().to_lowercase().replace('_', " ");
        WorkAreaKind::ALL
            .into_iter()
            .find(|area| area.name() == normalized)
            .ok_or_else(|| EngineError::UnknownWorkArea {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for WorkAreaKind {
    type Error = EngineError;

    fn try_from(value: String) -> EngineResult<Self> {
        value.parse()
    }
}

impl From<WorkAreaKind> for String {
    fn from(area: WorkAreaKind) -> Self {
        area.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<char> = WorkAreaKind::ALL.iter().map(|a| a.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), WorkAreaKind::ALL.len());
    }

    #[test]
    fn test_code_round_trips_through_lookup() {
        for area in WorkAreaKind::ALL {
            assert_eq!(WorkAreaKind::from_code(area.code()), Some(area));
        }
    }

    #[test]
    fn test_names_match_case_insensitively() {
        assert_eq!("KITCHEN".parse::<WorkAreaKind>().unwrap(), WorkAreaKind::Kitchen);
        assert_eq!(
            "store_room".parse::<WorkAreaKind>().unwrap(),
            WorkAreaKind::StoreRoom
        );
        assert_eq!(
            " House Keeping ".parse::<WorkAreaKind>().unwrap(),
            WorkAreaKind::HouseKeeping
        );
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        match "laundry".parse::<WorkAreaKind>() {
            Err(EngineError::UnknownWorkArea { name }) => assert_eq!(name, "laundry"),
            other => panic!("Expected UnknownWorkArea, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_code_has_no_area() {
        assert_eq!(WorkAreaKind::from_code('Z'), None);
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&WorkAreaKind::GuestServices).unwrap();
        assert_eq!(json, "\"guest services\"");
    }
}
