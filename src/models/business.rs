//! Business entities, venues and work areas.
//!
//! A business entity owns one or more venues; each venue is split into work
//! areas. Identifiers encode the hierarchy (see [`crate::identity`]), and the
//! checks here keep the encoded parents consistent with the actual ones.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EngineError, EngineResult};
use crate::identity::{Acn, CompanyId, IdKind, LinkingId, VenueId, WorkAreaId};

use super::work_area::WorkAreaKind;

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("phone pattern is valid"));

static POST_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("post code pattern is valid"));

/// A street address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    /// Street address.
    #[validate(length(min = 5, max = 200, message = "must be 5 to 200 characters"))]
    pub address: String,
    /// Suburb.
    #[validate(length(min = 2, max = 50, message = "must be 2 to 50 characters"))]
    pub suburb: String,
    /// State name or code.
    #[validate(length(min = 2, max = 50, message = "must be 2 to 50 characters"))]
    pub state: String,
    /// Four-digit post code.
    pub post_code: String,
}

impl Address {
    /// Checks field lengths and the post code.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.validate()?;
        if !POST_CODE.is_match(&self.post_code) {
            return Err(EngineError::validation("post_code", "must be 4 digits"));
        }
        Ok(())
    }
}

/// Business contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ContactDetails {
    /// Phone number, optionally with a leading `+`.
    pub phone: String,
    /// Contact email.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

impl ContactDetails {
    /// Checks the email and the phone number (spaces, dashes and brackets are ignored).
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.validate()?;
        if !is_valid_phone(&self.phone) {
            return Err(EngineError::validation("phone", "must be 8 to 15 digits"));
        }
        Ok(())
    }
}

/// Returns true if `phone` is a plausible phone number once separators are removed.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE.is_match(&compact)
}

/// The registered head office of a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadOffice {
    /// Postal address.
    #[serde(flatten)]
    pub address: Address,
    /// Contact details.
    pub contact: ContactDetails,
}

/// A physical site that one or more venues trade from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueLocation {
    /// Location identifier, `LOC-CCCC-NN`.
    pub location_id: String,
    /// Site address.
    pub address: Address,
}

/// A named work area within a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArea {
    /// The area's vocabulary name.
    pub work_area_name: WorkAreaKind,
    /// The area's identifier.
    pub work_area_id: WorkAreaId,
}

/// A trading venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Venue {
    /// The venue's identifier.
    pub venue_id: VenueId,
    /// Trading name.
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub venue_name: String,
    /// Linking ID of the venue manager.
    pub venue_manager_id: LinkingId,
    /// Name of the venue manager.
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub venue_manager_name: String,
    /// Where the venue trades from. Venues without one are their own location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<VenueLocation>,
    /// The venue's work areas.
    pub work_areas: Vec<WorkArea>,
}

impl Venue {
    /// The key that identifies this venue's location.
    pub fn location_key(&self) -> &str {
        self.location
            .as_ref()
            .map(|l| l.location_id.as_str())
            .unwrap_or_else(|| self.venue_id.as_str())
    }

    /// Finds a work area by name.
    pub fn work_area(&self, kind: WorkAreaKind) -> Option<&WorkArea> {
        self.work_areas.iter().find(|w| w.work_area_name == kind)
    }

    /// Checks the venue and its work areas.
    ///
    /// A venue needs at least one work area, must include the `venue` work
    /// area, may not repeat a work area, and every work area ID must carry
    /// this venue's company number and sequence.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.validate()?;

        if self.venue_manager_id.company_number() != self.venue_id.company_number() {
            return Err(EngineError::validation(
                "venue_manager_id",
                format!(
                    "{} is not employed by the company owning {}",
                    self.venue_manager_id, self.venue_id
                ),
            ));
        }

        if let Some(location) = &self.location {
            IdKind::Location.check(&location.location_id)?;
            location.address.ensure_valid()?;
        }

        if self.work_areas.is_empty() {
            return Err(EngineError::validation(
                "work_areas",
                "at least one work area is required",
            ));
        }
        if self.work_area(WorkAreaKind::Venue).is_none() {
            return Err(EngineError::validation(
                "work_areas",
                "a venue work area is required",
            ));
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for area in &self.work_areas {
            if !names.insert(area.work_area_name) {
                return Err(EngineError::validation(
                    "work_areas",
                    format!("duplicate work area '{}'", area.work_area_name),
                ));
            }
            if !ids.insert(area.work_area_id.as_str()) {
                return Err(EngineError::Duplicate {
                    entity: "Work area".to_string(),
                    id: area.work_area_id.to_string(),
                });
            }
            if !area.work_area_id.belongs_to_venue(&self.venue_id) {
                return Err(EngineError::validation(
                    "work_area_id",
                    format!(
                        "{} does not belong to venue {}",
                        area.work_area_id, self.venue_id
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// How a business's venues are spread across locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// One venue.
    SingleVenue,
    /// Several venues at several locations.
    MultiVenue,
    /// Several venues sharing one location.
    MultiOutlet,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityType::SingleVenue => "single-venue",
            EntityType::MultiVenue => "multi-venue",
            EntityType::MultiOutlet => "multi-outlet",
        })
    }
}

impl EntityType {
    /// Classifies a business from its venue and distinct location counts.
    pub fn classify(venue_count: usize, location_count: usize) -> Self {
        match (venue_count > 1, location_count > 1) {
            (true, true) => EntityType::MultiVenue,
            (true, false) => EntityType::MultiOutlet,
            _ => EntityType::SingleVenue,
        }
    }
}

/// A summary of a business's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    /// The derived entity type.
    pub entity_type: EntityType,
    /// Number of venues.
    pub venue_count: usize,
    /// Number of distinct locations.
    pub location_count: usize,
    /// Number of work areas across all venues.
    pub work_area_count: usize,
}

/// A tenant business.
///
/// # Example
///
/// ```
/// use repertoire_engine::models::{BusinessEntity, EntityType};
///
/// let json = r#"{
///     "company_id": "CNY-2976",
///     "company_name": "Le Repertoire Pty Ltd",
///     "director_name": "Alex Morgan",
///     "acn": "010 499 966",
///     "admin_user_id": "CNY-2976-2492",
///     "head_office": {
///         "address": "12 Collins Street",
///         "suburb": "Melbourne",
///         "state": "VIC",
///         "post_code": "3000",
///         "contact": { "phone": "0398765432", "email": "office@lerepertoire.com.au" }
///     },
///     "venues": [{
///         "venue_id": "VEN-2976-30",
///         "venue_name": "Le Repertoire",
///         "venue_manager_id": "EMP-2976-3087-308720",
///         "venue_manager_name": "Jordan Lee",
///         "work_areas": [
///             { "work_area_name": "venue", "work_area_id": "WAI-2976-3087" }
///         ]
///     }]
/// }"#;
///
/// let entity: BusinessEntity = serde_json::from_str(json).unwrap();
/// entity.ensure_valid().unwrap();
/// assert_eq!(entity.classify(), EntityType::SingleVenue);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BusinessEntity {
    /// The company's identifier.
    pub company_id: CompanyId,
    /// Registered company name.
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub company_name: String,
    /// Name of the company director.
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub director_name: String,
    /// Australian Company Number.
    pub acn: Acn,
    /// The administrator account, `CNY-CCCC-NNNN`.
    pub admin_user_id: String,
    /// Head office details.
    pub head_office: HeadOffice,
    /// The declared entity type, if one has been recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    /// The company's venues.
    pub venues: Vec<Venue>,
}

impl BusinessEntity {
    fn location_count(&self) -> usize {
        self.venues
            .iter()
            .map(Venue::location_key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Derives the entity type from the venues.
    pub fn classify(&self) -> EntityType {
        EntityType::classify(self.venues.len(), self.location_count())
    }

    /// The declared entity type, or the derived one when none is declared.
    pub fn effective_type(&self) -> EntityType {
        self.entity_type.unwrap_or_else(|| self.classify())
    }

    /// Summarises the business's shape.
    pub fn profile(&self) -> EntityProfile {
        EntityProfile {
            entity_type: self.classify(),
            venue_count: self.venues.len(),
            location_count: self.location_count(),
            work_area_count: self.venues.iter().map(|v| v.work_areas.len()).sum(),
        }
    }

    /// Finds a venue by ID.
    pub fn venue(&self, venue_id: &VenueId) -> Option<&Venue> {
        self.venues.iter().find(|v| &v.venue_id == venue_id)
    }

    /// Checks the business and every venue.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.validate()?;

        IdKind::AdminUser.check(&self.admin_user_id)?;
        if !self
            .admin_user_id
            .starts_with(&format!("{}-", self.company_id))
        {
            return Err(EngineError::validation(
                "admin_user_id",
                format!("must start with {}", self.company_id),
            ));
        }

        self.head_office.address.ensure_valid()?;
        self.head_office.contact.ensure_valid()?;

        if self.venues.is_empty() {
            return Err(EngineError::validation(
                "venues",
                "at least one venue is required",
            ));
        }

        let mut venue_ids = HashSet::new();
        for venue in &self.venues {
            if !venue.venue_id.belongs_to(&self.company_id) {
                return Err(EngineError::validation(
                    "venue_id",
                    format!("{} does not belong to {}", venue.venue_id, self.company_id),
                ));
            }
            if !venue_ids.insert(venue.venue_id.as_str()) {
                return Err(EngineError::Duplicate {
                    entity: "Venue".to_string(),
                    id: venue.venue_id.to_string(),
                });
            }
            venue.ensure_valid()?;
        }

        if let Some(declared) = self.entity_type {
            let derived = self.classify();
            if declared != derived {
                return Err(EngineError::validation(
                    "entity_type",
                    format!(
                        "declared {} but {} venues at {} locations make it {}",
                        declared,
                        self.venues.len(),
                        self.location_count(),
                        derived
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Adds a venue and reclassifies the business.
    ///
    /// Single-venue businesses cannot take another venue, and multi-outlet
    /// businesses only take venues at their existing location.
    pub fn add_venue(&mut self, venue: Venue) -> EngineResult<EntityType> {
        venue.ensure_valid()?;

        if !venue.venue_id.belongs_to(&self.company_id) {
            return Err(EngineError::validation(
                "venue_id",
                format!("{} does not belong to {}", venue.venue_id, self.company_id),
            ));
        }
        if self.venue(&venue.venue_id).is_some() {
            return Err(EngineError::Duplicate {
                entity: "Venue".to_string(),
                id: venue.venue_id.to_string(),
            });
        }

        match self.effective_type() {
            EntityType::SingleVenue if !self.venues.is_empty() => {
                return Err(EngineError::validation(
                    "entity_type",
                    "cannot add a venue to a single-venue entity",
                ));
            }
            EntityType::SingleVenue => {}
            EntityType::MultiOutlet => {
                let same_location = self
                    .venues
                    .iter()
                    .all(|existing| existing.location_key() == venue.location_key());
                if !same_location {
                    return Err(EngineError::validation(
                        "location",
                        "multi-outlet entities keep every venue at one location",
                    ));
                }
            }
            EntityType::MultiVenue => {}
        }

        self.venues.push(venue);
        let entity_type = self.classify();
        self.entity_type = Some(entity_type);
        Ok(entity_type)
    }
}
