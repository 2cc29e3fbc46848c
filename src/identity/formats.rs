//! Identifier formats.
//!
//! Company, venue, work-area, linking and payroll IDs are validated newtypes:
//! a value of one of these types always matches its format. Less central
//! formats are checked through [`IdKind::matches`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::WorkAreaKind;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("identifier patterns are valid regular expressions")
}

static COMPANY_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^CNY-[0-9]{4}$"));
static VENUE_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^VEN-[0-9]{4}-[0-9]{2}$"));
static WORK_AREA_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^WAI-[0-9]{4}-[0-9]{4}$"));
static LINKING_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^EMP-[0-9]{4}-[0-9]{4}-[0-9]{6}$"));
static PAYROLL_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^D[A-Z]-[0-9]{6}$"));
static ADMIN_USER_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^CNY-[0-9]{4}-[0-9]{4}$"));
static LOCATION_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^LOC-[0-9]{4}-[0-9]{2}$"));
static ROLE_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^(FOH|BOH)-[A-Z]{3}-[0-9]{3}$"));
static REQUEST_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^REQ-[0-9]{8}-[0-9]{5}$"));
static USER_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^USR-[A-Z]{2}[0-9]{6}$"));
static BUSINESS_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^BUS-[A-Z0-9]{8}$"));
static WORKER_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^WRK-[A-Z0-9]{8}$"));

/// Every identifier format the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// `CNY-NNNN`
    Company,
    /// `VEN-CCCC-NN`
    Venue,
    /// `WAI-CCCC-VVNN`
    WorkArea,
    /// `EMP-CCCC-WWWW-NNNNNN`
    Linking,
    /// `D<code>-NNNNNN`
    Payroll,
    /// `CNY-CCCC-NNNN`
    AdminUser,
    /// `LOC-CCCC-NN`
    Location,
    /// `FOH-XXX-NNN` or `BOH-XXX-NNN`
    Role,
    /// `REQ-YYYYMMDD-NNNNN`
    Request,
    /// Legacy `USR-XXNNNNNN`
    User,
    /// Legacy `BUS-XXXXXXXX`
    Business,
    /// Legacy `WRK-XXXXXXXX`
    Worker,
}

impl IdKind {
    /// The human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            IdKind::Company => "company",
            IdKind::Venue => "venue",
            IdKind::WorkArea => "work area",
            IdKind::Linking => "linking",
            IdKind::Payroll => "payroll",
            IdKind::AdminUser => "admin user",
            IdKind::Location => "location",
            IdKind::Role => "role",
            IdKind::Request => "request",
            IdKind::User => "user",
            IdKind::Business => "business",
            IdKind::Worker => "worker",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            IdKind::Company => &COMPANY_ID,
            IdKind::Venue => &VENUE_ID,
            IdKind::WorkArea => &WORK_AREA_ID,
            IdKind::Linking => &LINKING_ID,
            IdKind::Payroll => &PAYROLL_ID,
            IdKind::AdminUser => &ADMIN_USER_ID,
            IdKind::Location => &LOCATION_ID,
            IdKind::Role => &ROLE_ID,
            IdKind::Request => &REQUEST_ID,
            IdKind::User => &USER_ID,
            IdKind::Business => &BUSINESS_ID,
            IdKind::Worker => &WORKER_ID,
        }
    }

    /// The regular expression the format is defined by.
    pub fn pattern(&self) -> &'static str {
        self.regex().as_str()
    }

    /// Returns true if `value` matches this format exactly.
    ///
    /// # Example
    ///
    /// ```
    /// use repertoire_engine::identity::IdKind;
    ///
    /// assert!(IdKind::Role.matches("FOH-BAR-001"));
    /// assert!(!IdKind::Role.matches("XOH-BAR-001"));
    /// ```
    pub fn matches(&self, value: &str) -> bool {
        self.regex().is_match(value)
    }

    /// Checks `value` against this format.
    pub fn check(&self, value: &str) -> EngineResult<()> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(EngineError::invalid_id(self.label(), value))
        }
    }
}

macro_rules! validated_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses and validates an identifier. Surrounding whitespace is ignored.
            pub fn parse(value: &str) -> EngineResult<Self> {
                let trimmed = value.trim();
                $kind.check(trimmed).map_err(|_| EngineError::invalid_id($kind.label(), value))?;
                Ok(Self(trimmed.to_string()))
            }

            /// The identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> EngineResult<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EngineError;

            fn try_from(value: String) -> EngineResult<Self> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_id!(
    /// A company identifier, `CNY-NNNN`.
    CompanyId,
    IdKind::Company
);

validated_id!(
    /// A venue identifier, `VEN-CCCC-NN`, where `CCCC` is the owning company's number.
    VenueId,
    IdKind::Venue
);

validated_id!(
    /// A work area identifier, `WAI-CCCC-VVNN`.
    ///
    /// `VV` is the owning venue's sequence and `NN` the work area's sequence
    /// within that venue.
    WorkAreaId,
    IdKind::WorkArea
);

validated_id!(
    /// An employee linking identifier, `EMP-CCCC-WWWW-NNNNNN`.
    ///
    /// `WWWW` repeats the last part of the employee's work area ID and the
    /// employee number is at least 100000.
    LinkingId,
    IdKind::Linking
);

validated_id!(
    /// A payroll identifier, `D<code>-NNNNNN`, where `<code>` is the work area letter.
    PayrollId,
    IdKind::Payroll
);

impl CompanyId {
    /// Builds a company ID from its four-digit number.
    pub fn from_number(number: u16) -> EngineResult<Self> {
        Self::parse(&format!("CNY-{:04}", number))
    }

    /// The four-digit company number.
    pub fn number(&self) -> &str {
        &self.0[4..8]
    }
}

impl VenueId {
    /// The owning company's number.
    pub fn company_number(&self) -> &str {
        &self.0[4..8]
    }

    /// The two-digit venue sequence.
    pub fn sequence(&self) -> &str {
        &self.0[9..11]
    }

    /// Returns true if the venue belongs to `company`.
    pub fn belongs_to(&self, company: &CompanyId) -> bool {
        self.company_number() == company.number()
    }
}

impl WorkAreaId {
    /// The owning company's number.
    pub fn company_number(&self) -> &str {
        &self.0[4..8]
    }

    /// The four-digit suffix repeated in linking IDs.
    pub fn suffix(&self) -> &str {
        &self.0[9..13]
    }

    /// The owning venue's sequence.
    pub fn venue_sequence(&self) -> &str {
        &self.0[9..11]
    }

    /// Returns true if the work area belongs to `company`.
    pub fn belongs_to(&self, company: &CompanyId) -> bool {
        self.company_number() == company.number()
    }

    /// Returns true if the work area belongs to `venue`.
    pub fn belongs_to_venue(&self, venue: &VenueId) -> bool {
        self.company_number() == venue.company_number()
            && self.venue_sequence() == venue.sequence()
    }
}

impl LinkingId {
    /// The employing company's number.
    pub fn company_number(&self) -> &str {
        &self.0[4..8]
    }

    /// The work area suffix.
    pub fn work_area_suffix(&self) -> &str {
        &self.0[9..13]
    }

    /// The six-digit employee number.
    pub fn employee_number(&self) -> u32 {
        // The format guarantees six ASCII digits.
        self.0[14..20].parse().unwrap_or_default()
    }
}

impl PayrollId {
    /// The work area code letter.
    pub fn area_code(&self) -> char {
        // The format guarantees an ASCII letter at index 1.
        self.0.as_bytes()[1] as char
    }

    /// The work area the code letter denotes, if any.
    pub fn work_area(&self) -> Option<WorkAreaKind> {
        WorkAreaKind::from_code(self.area_code())
    }

    /// The six-digit payroll number.
    pub fn number(&self) -> &str {
        &self.0[3..9]
    }
}
