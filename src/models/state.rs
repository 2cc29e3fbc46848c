//! Australian states and territories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An Australian state or territory.
///
/// State codes are case-insensitive on input and always rendered in upper case.
///
/// # Example
///
/// ```
/// use repertoire_engine::models::AustralianState;
///
/// let state: AustralianState = "nsw".parse().unwrap();
/// assert_eq!(state, AustralianState::Nsw);
/// assert_eq!(state.to_string(), "NSW");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AustralianState {
    /// New South Wales.
    #[serde(alias = "nsw")]
    Nsw,
    /// Victoria.
    #[serde(alias = "vic")]
    Vic,
    /// Queensland.
    #[serde(alias = "qld")]
    Qld,
    /// Western Australia.
    #[serde(alias = "wa")]
    Wa,
    /// South Australia.
    #[serde(alias = "sa")]
    Sa,
    /// Tasmania.
    #[serde(alias = "tas")]
    Tas,
    /// Australian Capital Territory.
    #[serde(alias = "act")]
    Act,
    /// Northern Territory.
    #[serde(alias = "nt")]
    Nt,
}

impl AustralianState {
    /// Every state and territory.
    pub const ALL: [AustralianState; 8] = [
        AustralianState::Nsw,
        AustralianState::Vic,
        AustralianState::Qld,
        AustralianState::Wa,
        AustralianState::Sa,
        AustralianState::Tas,
        AustralianState::Act,
        AustralianState::Nt,
    ];

    /// The upper-case state code.
    pub fn code(&self) -> &'static str {
        match self {
            AustralianState::Nsw => "NSW",
            AustralianState::Vic => "VIC",
            AustralianState::Qld => "QLD",
            AustralianState::Wa => "WA",
            AustralianState::Sa => "SA",
            AustralianState::Tas => "TAS",
            AustralianState::Act => "ACT",
            AustralianState::Nt => "NT",
        }
    }
}

impl fmt::Display for AustralianState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AustralianState {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let normalized = s.trim().to_uppercase();
        AustralianState::ALL
            .into_iter()
            .find(|state| state.code() == normalized)
            .ok_or_else(|| EngineError::InvalidStateCode {
                code: s.to_string(),
            })
    }
}
