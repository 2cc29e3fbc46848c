//! Annual leave accrual.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LeaveConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AustralianState, LeaveType};

/// Years of service between two dates, as days / 365.25 rounded to 2 places.
///
/// Never negative.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use repertoire_engine::calculation::service_years;
/// use rust_decimal::Decimal;
///
/// let hired = NaiveDate::from_ymd_opt(2017, 7, 1).unwrap();
/// let as_of = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
/// assert_eq!(service_years(hired, as_of), Decimal::new(700, 2));
/// ```
pub fn service_years(hired: NaiveDate, as_of: NaiveDate) -> Decimal {
    let days = (as_of - hired).num_days().max(0);
    (Decimal::from(days) / Decimal::new(36525, 2)).round_dp(2)
}

/// The result of a leave accrual calculation, including the audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAccrualResult {
    /// The leave type.
    pub leave_type: LeaveType,
    /// FTE used, after capping at 1.
    pub fte: Decimal,
    /// Years of service considered.
    pub service_years: Decimal,
    /// The state whose long service rules applied, for long service leave.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AustralianState>,
    /// Whether the employee accrues this leave type yet.
    pub eligible: bool,
    /// Hours accrued per year, rounded to 2 places.
    pub hours: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the hours of leave accrued per year.
///
/// Standard leave types accrue their annual hours × FTE. Long service leave
/// accrues nothing until the state's eligibility period is served, then the
/// state's annual hours × FTE.
///
/// # Errors
///
/// Returns `Validation` for a negative FTE or negative service, and
/// `StateConfigNotFound` if the state has no long service rule.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::calculate_leave_accrual;
/// use repertoire_engine::config::ConfigLoader;
/// use repertoire_engine::models::LeaveType;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let result = calculate_leave_accrual(
///     Decimal::new(5, 1),
///     Decimal::from(2),
///     LeaveType::Annual,
///     None,
///     config.leave(),
///     1,
/// )
/// .unwrap();
/// assert_eq!(result.hours, Decimal::from(76));
/// ```
pub fn calculate_leave_accrual(
    fte: Decimal,
    service_years: Decimal,
    leave_type: LeaveType,
    state: Option<AustralianState>,
    config: &LeaveConfig,
    step_number: u32,
) -> EngineResult<LeaveAccrualResult> {
    if fte < Decimal::ZERO {
        return Err(EngineError::validation("fte", "cannot be negative"));
    }
    if service_years < Decimal::ZERO {
        return Err(EngineError::validation("service_years", "cannot be negative"));
    }
    let fte = fte.min(Decimal::ONE);

    let annual = &config.annual_hours;
    let standard = |per_year: Decimal| {
        let hours = (per_year * fte).round_dp(2);
        (
            hours,
            true,
            None::<AustralianState>,
            format!("{} hours x {} FTE = {}", per_year, fte, hours),
        )
    };
    let (hours, eligible, state, reasoning) = match leave_type {
        LeaveType::LongService => {
            let (state, rule) = config.long_service.rule(state)?;
            let required = Decimal::from(rule.eligibility_years);
            if service_years >= required {
                let hours = (rule.hours_per_year * fte).round_dp(2);
                (
                    hours,
                    true,
                    Some(state),
                    format!(
                        "{} years served meets {} eligibility of {} years: {} x {} FTE",
                        service_years, state, required, rule.hours_per_year, fte
                    ),
                )
            } else {
                (
                    Decimal::ZERO,
                    false,
                    Some(state),
                    format!(
                        "{} years served is short of {} eligibility of {} years",
                        service_years, state, required
                    ),
                )
            }
        }
        LeaveType::Annual => standard(annual.annual),
        LeaveType::Sick => standard(annual.sick),
        LeaveType::Carers => standard(annual.carers),
        LeaveType::Bereavement => standard(annual.bereavement),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "leave_accrual".to_string(),
        rule_name: "Leave Accrual".to_string(),
        reference: "leave.yaml".to_string(),
        input: serde_json::json!({
            "leave_type": leave_type.key(),
            "fte": fte.to_string(),
            "service_years": service_years.to_string()
        }),
        output: serde_json::json!({
            "hours": hours.to_string(),
            "eligible": eligible
        }),
        reasoning,
    };

    Ok(LeaveAccrualResult {
        leave_type,
        fte,
        service_years,
        state,
        eligible,
        hours,
        audit_step,
    })
}
