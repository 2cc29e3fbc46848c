//! Fortnightly leave accrual across a company.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::LeaveConfig;
use crate::error::{EngineError, EngineResult};
use crate::identity::CompanyId;
use crate::models::{BusinessUser, LeaveType};

use super::leave_accrual::{calculate_leave_accrual, service_years};

/// One user the batch could not update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualFailure {
    /// The user's payroll ID.
    pub payroll_id: String,
    /// Why the update failed.
    pub error: String,
}

/// Outcome of [`batch_update_accruals`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAccrualReport {
    /// Active users of the company considered.
    pub total: usize,
    /// Users credited with a period's accrual.
    pub success: usize,
    /// Casual users, who do not accrue leave.
    pub skipped: usize,
    /// Users whose records could not be accrued.
    pub failed: usize,
    /// One entry per failure.
    pub failures: Vec<AccrualFailure>,
}

fn accrue_user(user: &mut BusinessUser, as_of: NaiveDate, config: &LeaveConfig) -> EngineResult<()> {
    let details = &user.employment_details;
    details.ensure_valid()?;
    if details.hired_date > as_of {
        return Err(EngineError::validation(
            "hired_date",
            format!("{} is after {}", details.hired_date, as_of),
        ));
    }

    let fte = details.fte();
    let years = service_years(details.hired_date, as_of);
    let periods = Decimal::from(config.accrual_periods_per_year);

    let mut credits = Vec::with_capacity(LeaveType::STANDARD.len());
    for leave_type in LeaveType::STANDARD {
        let annual = calculate_leave_accrual(fte, years, leave_type, details.work_state, config, 1)?;
        credits.push((leave_type, annual.hours / periods));
    }

    for (leave_type, hours) in credits {
        if let Some(balance) = user.leave_entitlements.balance_mut(leave_type) {
            balance.accrued += hours;
        }
    }
    user.accrued_employment.days_employed = user.employment_details.days_employed(as_of);
    Ok(())
}

/// Credits one accrual period of leave to every active user of a company.
///
/// Each standard leave type receives its annual accrual divided by the
/// configured periods per year. Casual users are skipped. Users with invalid
/// employment details, or hired after `as_of`, are counted as failures and
/// left untouched.
pub fn batch_update_accruals(
    users: &mut [BusinessUser],
    company: &CompanyId,
    as_of: NaiveDate,
    config: &LeaveConfig,
) -> BatchAccrualReport {
    let mut report = BatchAccrualReport::default();

    for user in users
        .iter_mut()
        .filter(|u| &u.company_id == company && u.is_active())
    {
        report.total += 1;

        if user.is_casual() {
            report.skipped += 1;
            continue;
        }

        match accrue_user(user, as_of, config) {
            Ok(()) => report.success += 1,
            Err(e) => {
                error!(payroll_id = %user.payroll_id, error = %e, "Leave accrual failed");
                report.failed += 1;
                report.failures.push(AccrualFailure {
                    payroll_id: user.payroll_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        company_id = %company,
        total = report.total,
        success = report.success,
        skipped = report.skipped,
        failed = report.failed,
        "Batch leave accrual complete"
    );

    report
}
