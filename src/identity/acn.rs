//! Australian Company Number (ACN) validation.
//!
//! An ACN is nine digits. The first eight are weighted 8 down to 1 and summed;
//! the ninth digit is the complement of that sum modulo 10.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const WEIGHTS: [u32; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

/// A checksum-validated Australian Company Number.
///
/// Displays and serializes in the canonical `XXX XXX XXX` form.
///
/// # Example
///
/// ```
/// use repertoire_engine::identity::Acn;
///
/// let acn = Acn::parse("010499966").unwrap();
/// assert_eq!(acn.to_string(), "010 499 966");
/// assert!(Acn::parse("010 499 967").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Acn([u8; 9]);

impl Acn {
    /// Parses an ACN, accepting nine digits with optional spaces.
    pub fn parse(value: &str) -> EngineResult<Self> {
        let compact: String = value.chars().filter(|c| *c != ' ').collect();

        if compact.len() != 9 || !compact.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::InvalidAcn {
                value: value.to_string(),
                message: "must be exactly 9 digits".to_string(),
            });
        }

        let mut digits = [0u8; 9];
        for (slot, byte) in digits.iter_mut().zip(compact.bytes()) {
            *slot = byte - b'0';
        }

        let expected = check_digit(&digits);
        if u32::from(digits[8]) != expected {
            return Err(EngineError::InvalidAcn {
                value: value.to_string(),
                message: format!("check digit should be {}", expected),
            });
        }

        Ok(Self(digits))
    }

    /// The nine digits without separators.
    pub fn digits(&self) -> String {
        self.0.iter().map(|d| char::from(b'0' + d)).collect()
    }
}

/// Computes the check digit for the first eight digits of an ACN.
fn check_digit(digits: &[u8; 9]) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip(WEIGHTS)
        .map(|(digit, weight)| u32::from(*digit) * weight)
        .sum();
    (10 - sum % 10) % 10
}

/// Returns true if `value` is a valid ACN.
pub fn validate_acn(value: &str) -> bool {
    Acn::parse(value).is_ok()
}

impl fmt::Display for Acn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.digits();
        write!(f, "{} {} {}", &digits[0..3], &digits[3..6], &digits[6..9])
    }
}

impl FromStr for Acn {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Acn {
    type Error = EngineError;

    fn try_from(value: String) -> EngineResult<Self> {
        Self::parse(&value)
    }
}

impl From<Acn> for String {
    fn from(acn: Acn) -> Self {
        acn.to_string()
    }
}
