//! Payslip generation.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditTrace, BusinessUser};

use super::financial_year::FinancialYear;
use super::income_tax::TaxResidency;
use super::leave_summary::{LeaveSummary, leave_summary};
use super::medicare::MedicareProfile;
use super::period_amounts::{PayFrequency, PeriodAmounts, PeriodRequest, calculate_period_amounts};
use super::ytd::{YtdAmounts, ytd_amounts};

/// The pay run a payslip is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipRequest {
    /// Date the pay is made. Selects the financial year.
    pub pay_date: NaiveDate,
    /// First day of the pay period.
    pub pay_period_start: NaiveDate,
    /// Last day of the pay period.
    pub pay_period_end: NaiveDate,
    /// Pay frequency.
    #[serde(default)]
    pub pay_frequency: PayFrequency,
    /// Resident or foreign resident.
    #[serde(default)]
    pub residency: TaxResidency,
    /// Medicare levy threshold selection.
    #[serde(default)]
    pub medicare: MedicareProfile,
}

/// Who the payslip is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipEmployee {
    /// Payroll ID.
    pub payroll_id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Preferred name.
    pub preferred_name: Option<String>,
    /// Role title.
    pub position: String,
    /// Work area.
    pub department: String,
}

/// Who is paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipCompany {
    /// Company name.
    pub name: String,
    /// Venue name.
    pub venue: String,
}

/// When and how often.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipPayment {
    /// Date paid.
    pub pay_date: NaiveDate,
    /// Period start.
    pub pay_period_start: NaiveDate,
    /// Period end.
    pub pay_period_end: NaiveDate,
    /// Pay frequency.
    pub pay_frequency: PayFrequency,
    /// The financial year whose rates applied.
    pub financial_year: String,
}

/// Earnings for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipEarnings {
    /// Gross pay.
    pub gross: Decimal,
    /// Tax withheld, including the Medicare levy.
    pub tax: Decimal,
    /// Medicare levy portion of `tax`.
    pub medicare: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// Superannuation.
    #[serde(rename = "super")]
    pub super_amount: Decimal,
    /// Hourly equivalent.
    pub hourly_rate: Decimal,
    /// Standard hours in the period.
    pub hours: Decimal,
}

impl From<&PeriodAmounts> for PayslipEarnings {
    fn from(amounts: &PeriodAmounts) -> Self {
        Self {
            gross: amounts.gross,
            tax: amounts.tax,
            medicare: amounts.medicare,
            net: amounts.net,
            super_amount: amounts.super_amount,
            hourly_rate: amounts.hourly_rate,
            hours: amounts.hours,
        }
    }
}

/// A complete payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique payslip identifier.
    pub id: Uuid,
    /// When the payslip was produced.
    pub generated_at: DateTime<Utc>,
    /// Employee block.
    pub employee: PayslipEmployee,
    /// Company block.
    pub company: PayslipCompany,
    /// Payment block.
    pub payment: PayslipPayment,
    /// Period earnings.
    pub earnings: PayslipEarnings,
    /// Year-to-date totals before this payment.
    pub ytd: YtdAmounts,
    /// Leave balances at the period end.
    pub leave: LeaveSummary,
    /// How the earnings were reached.
    pub audit_trace: AuditTrace,
}

/// Builds a payslip for one pay period.
///
/// Earnings come from the employee's annual salary at the rates of the
/// financial year containing the pay date. An employee with no recorded pay
/// rate gets a zero payslip with a warning.
///
/// # Errors
///
/// Returns `Validation` if the user record is invalid, its pay rate is out of
/// range, or the period ends before it starts.
pub fn generate_payslip(
    user: &BusinessUser,
    request: &PayslipRequest,
    config: &ConfigLoader,
) -> EngineResult<Payslip> {
    let start_time = Instant::now();

    user.ensure_valid()?;

    if request.pay_period_end < request.pay_period_start {
        return Err(EngineError::validation(
            "pay_period_end",
            "pay period end cannot be before its start",
        ));
    }

    let year = FinancialYear::for_date(request.pay_date);
    let tax_year = config.tax_year_for(year);

    let annual_salary = user.employment_details.annual_salary()?;
    let period_request = PeriodRequest {
        annual_salary: annual_salary.unwrap_or(Decimal::ZERO),
        pay_frequency: request.pay_frequency,
        residency: request.residency,
        include_medicare: true,
        medicare: request.medicare,
    };
    let mut amounts =
        calculate_period_amounts(&period_request, tax_year, &config.leave().standard_hours)?;

    let mut trace = std::mem::take(&mut amounts.audit_trace);
    if annual_salary.is_none() {
        trace.warn(
            "NO_PAY_RATE",
            format!("{} has no recorded pay rate", user.payroll_id),
            "high",
        );
    }
    if !config.has_tax_year(year) {
        trace.warn(
            "TAX_YEAR_FALLBACK",
            format!(
                "No rates configured for {}; used {}",
                year, tax_year.financial_year
            ),
            "medium",
        );
    }

    let leave = leave_summary(
        &user.leave_entitlements,
        &user.employment_details,
        request.pay_period_end,
        config.leave(),
    )?;

    trace.duration_us = start_time.elapsed().as_micros() as u64;

    Ok(Payslip {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        employee: PayslipEmployee {
            payroll_id: user.payroll_id.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            preferred_name: user.preferred_name.clone(),
            position: user.role_name.clone(),
            department: user.work_area_name.to_string(),
        },
        company: PayslipCompany {
            name: user.company_name.clone(),
            venue: user.venue_name.clone(),
        },
        payment: PayslipPayment {
            pay_date: request.pay_date,
            pay_period_start: request.pay_period_start,
            pay_period_end: request.pay_period_end,
            pay_frequency: request.pay_frequency,
            financial_year: tax_year.financial_year.clone(),
        },
        earnings: PayslipEarnings::from(&amounts),
        ytd: ytd_amounts(&user.accrued_employment, tax_year.super_guarantee_rate),
        leave,
        audit_trace: trace,
    })
}
