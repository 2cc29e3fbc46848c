//! Leave balances as shown to employees.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LeaveConfig;
use crate::error::EngineResult;
use crate::models::{AustralianState, EmploymentDetails, LeaveEntitlements, LeaveType};

use super::leave_accrual::service_years;

/// One leave type's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveLine {
    /// The leave type.
    pub leave_type: LeaveType,
    /// Display name.
    pub name: String,
    /// Hours accrued.
    pub accrued: Decimal,
    /// Hours taken.
    pub taken: Decimal,
    /// Accrued less taken.
    pub balance: Decimal,
}

/// Long service leave position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongServiceSummary {
    /// Display name.
    pub name: String,
    /// The state whose rules applied.
    pub state: AustralianState,
    /// Years served.
    pub service_years: Decimal,
    /// Whether the eligibility period has been served.
    pub eligible: bool,
    /// Hours accrued since becoming eligible.
    pub accrued: Decimal,
    /// Hours taken.
    pub taken: Decimal,
    /// Accrued less taken.
    pub balance: Decimal,
    /// Years left to serve, when not yet eligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_to_eligible: Option<Decimal>,
    /// When the employee becomes eligible, if not yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_date: Option<NaiveDate>,
}

/// All of an employee's leave balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSummary {
    /// Standard leave types in display order.
    pub balances: Vec<LeaveLine>,
    /// Long service leave.
    pub long_service: LongServiceSummary,
}

impl LeaveSummary {
    /// The line for a standard leave type.
    pub fn line(&self, leave_type: LeaveType) -> Option<&LeaveLine> {
        self.balances.iter().find(|l| l.leave_type == leave_type)
    }
}

/// Summarises leave balances as of a date.
///
/// Standard types report their recorded balances. Long service leave is
/// derived from service: once eligible, each year served beyond the
/// eligibility period is worth the state's annual hours. Before that, the
/// summary reports how long remains and the date eligibility is reached
/// (the hired date plus ⌊eligibility years × 365.25⌋ days).
pub fn leave_summary(
    entitlements: &LeaveEntitlements,
    details: &EmploymentDetails,
    as_of: NaiveDate,
    config: &LeaveConfig,
) -> EngineResult<LeaveSummary> {
    let balances = LeaveType::STANDARD
        .iter()
        .filter_map(|&leave_type| {
            entitlements.balance(leave_type).map(|balance| LeaveLine {
                leave_type,
                name: leave_type.display_name().to_string(),
                accrued: balance.accrued.round_dp(2),
                taken: balance.taken.round_dp(2),
                balance: balance.remaining().round_dp(2),
            })
        })
        .collect();

    let (state, rule) = config.long_service.rule(details.work_state)?;
    let years = service_years(details.hired_date, as_of);
    let required = Decimal::from(rule.eligibility_years);
    let long_service = if years >= required {
        let taken = entitlements.long_service_taken;
        let accrued = ((years - required) * rule.hours_per_year).round_dp(2);
        LongServiceSummary {
            name: LeaveType::LongService.display_name().to_string(),
            state,
            service_years: years,
            eligible: true,
            accrued,
            taken,
            balance: accrued - taken,
            years_to_eligible: None,
            eligible_date: None,
        }
    } else {
        let days = i64::from(rule.eligibility_years) * 36525 / 100;
        LongServiceSummary {
            name: LeaveType::LongService.display_name().to_string(),
            state,
            service_years: years,
            eligible: false,
            accrued: Decimal::ZERO,
            taken: Decimal::ZERO,
            balance: Decimal::ZERO,
            years_to_eligible: Some(required - years),
            eligible_date: Some(details.hired_date + Duration::days(days)),
        }
    };

    Ok(LeaveSummary {
        balances,
        long_service,
    })
}
