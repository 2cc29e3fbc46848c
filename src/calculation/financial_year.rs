//! Australian financial years.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An Australian financial year, 1 July to 30 June, written `YYYY-YY`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use repertoire_engine::calculation::FinancialYear;
///
/// let year = FinancialYear::for_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
/// assert_eq!(year.to_string(), "2024-25");
/// assert_eq!("2024-25".parse::<FinancialYear>().unwrap(), year);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear {
    start_year: i32,
}

impl FinancialYear {
    /// The financial year beginning 1 July of `start_year`.
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The financial year containing `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() >= 7 {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    /// The calendar year the financial year starts in.
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// True if `date` falls within this financial year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::for_date(date) == *self
    }

    /// The following financial year.
    pub fn next(&self) -> Self {
        Self::new(self.start_year + 1)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

impl FromStr for FinancialYear {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let invalid = || {
            EngineError::validation(
                "financial_year",
                format!("'{}' is not a financial year in YYYY-YY form", s),
            )
        };

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(invalid());
        }
        let start_year: i32 = start.parse().map_err(|_| invalid())?;
        let end_year: i32 = end.parse().map_err(|_| invalid())?;

        if (start_year + 1).rem_euclid(100) != end_year {
            return Err(invalid());
        }
        Ok(Self::new(start_year))
    }
}

impl TryFrom<String> for FinancialYear {
    type Error = EngineError;

    fn try_from(value: String) -> EngineResult<Self> {
        value.parse()
    }
}

impl From<FinancialYear> for String {
    fn from(year: FinancialYear) -> Self {
        year.to_string()
    }
}
