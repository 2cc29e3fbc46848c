//! Leave types recognised by the accrual and summary calculators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A kind of paid leave.
///
/// Leave types accept the aliases used by older records, so `annual_leave`
/// and `holiday` both refer to [`LeaveType::Annual`].
///
/// # Example
///
/// ```
/// use repertoire_engine::models::LeaveType;
///
/// let leave: LeaveType = "personal_leave".parse().unwrap();
/// assert_eq!(leave, LeaveType::Carers);
/// assert_eq!(leave.display_name(), "Personal/Carer's Leave");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Annual (holiday) leave.
    #[serde(alias = "holiday", alias = "annual_leave")]
    Annual,
    /// Sick leave.
    #[serde(alias = "sick_leave")]
    Sick,
    /// Personal/carer's leave.
    #[serde(alias = "personal_leave", alias = "carers_leave")]
    Carers,
    /// Compassionate/bereavement leave.
    #[serde(alias = "bereavement_leave", alias = "compassionate")]
    Bereavement,
    /// Long service leave.
    #[serde(alias = "long_service_leave")]
    LongService,
}

impl LeaveType {
    /// The leave types accrued every pay run.
    pub const STANDARD: [LeaveType; 4] = [
        LeaveType::Annual,
        LeaveType::Sick,
        LeaveType::Carers,
        LeaveType::Bereavement,
    ];

    /// The canonical identifier.
    pub fn key(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Carers => "carers",
            LeaveType::Bereavement => "bereavement",
            LeaveType::LongService => "long_service",
        }
    }

    /// The name shown on payslips and leave summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual Leave",
            LeaveType::Sick => "Sick Leave",
            LeaveType::Carers => "Personal/Carer's Leave",
            LeaveType::Bereavement => "Bereavement Leave",
            LeaveType::LongService => "Long Service Leave",
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LeaveType {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "annual_leave" | "holiday" => Ok(LeaveType::Annual),
            "sick" | "sick_leave" => Ok(LeaveType::Sick),
            "carers" | "carers_leave" | "personal_leave" => Ok(LeaveType::Carers),
            "bereavement" | "bereavement_leave" | "compassionate" => Ok(LeaveType::Bereavement),
            "long_service" | "long_service_leave" => Ok(LeaveType::LongService),
            _ => Err(EngineError::validation(
                "leave_type",
                format!("unknown leave type '{}'", s),
            )),
        }
    }
}
