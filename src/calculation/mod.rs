//! Payroll and leave calculations for the Repertoire engine.
//!
//! This module contains the Australian payroll calculators: income tax with
//! the Low Income Tax Offset, the Medicare levy, superannuation, per-period
//! pay amounts, year-to-date figures, payslips and state payroll tax. It also
//! holds the leave accrual and leave summary calculators.
//!
//! Rates come from [`crate::config::ConfigLoader`]; every calculator that
//! produces money rounds to cents with banker's rounding.

mod batch_accrual;
mod financial_year;
mod income_tax;
mod leave_accrual;
mod leave_summary;
mod lito;
mod medicare;
mod payroll_tax;
mod payslip;
mod period_amounts;
mod superannuation;
mod ytd;

use rust_decimal::Decimal;

pub use batch_accrual::{AccrualFailure, BatchAccrualReport, batch_update_accruals};
pub use financial_year::FinancialYear;
pub use income_tax::{IncomeTaxResult, TaxResidency, bracket_tax, calculate_income_tax};
pub use leave_accrual::{LeaveAccrualResult, calculate_leave_accrual, service_years};
pub use leave_summary::{LeaveLine, LeaveSummary, LongServiceSummary, leave_summary};
pub use lito::calculate_lito;
pub use medicare::{FamilyStatus, MedicareProfile, MedicareResult, calculate_medicare_levy};
pub use payroll_tax::{PayrollTaxResult, calculate_payroll_tax};
pub use payslip::{
    Payslip, PayslipCompany, PayslipEarnings, PayslipEmployee, PayslipPayment, PayslipRequest,
    generate_payslip,
};
pub use period_amounts::{
    PayFrequency, PeriodAmounts, PeriodRequest, annual_salary, calculate_period_amounts,
    hourly_rate,
};
pub use superannuation::{SuperResult, calculate_superannuation};
pub use ytd::{YtdAmounts, record_payment, ytd_amounts};

/// Rounds to cents, half to even, always carrying two decimal places.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::round_cents;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_cents(Decimal::new(2345, 3)).to_string(), "2.34");
/// assert_eq!(round_cents(Decimal::from(7)).to_string(), "7.00");
/// ```
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}
