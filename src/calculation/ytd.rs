//! Year-to-date pay figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::AccruedEmployment;

use super::period_amounts::PeriodAmounts;
use super::round_cents;

/// Year-to-date totals as shown on a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdAmounts {
    /// Gross earnings.
    pub earnings: Decimal,
    /// Tax withheld, including the Medicare levy.
    pub tax: Decimal,
    /// Medicare levy withheld.
    pub medicare: Decimal,
    /// Superannuation.
    #[serde(rename = "super")]
    pub super_amount: Decimal,
}

/// Reads YTD totals from an employee's accrued employment record.
///
/// Tax falls back to the legacy `tax_withheld` figure when no YTD figure is
/// recorded. Super falls back to earnings at the guarantee rate when none
/// (or zero) is recorded.
pub fn ytd_amounts(accrued: &AccruedEmployment, super_guarantee_rate: Decimal) -> YtdAmounts {
    let tax = accrued.tax_withheld_ytd.unwrap_or(accrued.tax_withheld);
    let super_amount = accrued
        .super_ytd
        .filter(|amount| !amount.is_zero())
        .unwrap_or(accrued.salary_ytd * super_guarantee_rate);

    YtdAmounts {
        earnings: round_cents(accrued.salary_ytd),
        tax: round_cents(tax),
        medicare: round_cents(accrued.medicare_ytd),
        super_amount: round_cents(super_amount),
    }
}

fn add(field: &str, total: Decimal, amount: Decimal) -> EngineResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::validation(field, "year-to-date total is too large"))
}

/// Adds one period's payment into the YTD figures.
///
/// Returns the updated totals. The record is left untouched if any total
/// would overflow.
pub fn record_payment(
    accrued: &mut AccruedEmployment,
    payment: &PeriodAmounts,
    super_guarantee_rate: Decimal,
) -> EngineResult<YtdAmounts> {
    let current = ytd_amounts(accrued, super_guarantee_rate);

    let earnings = add("salary_ytd", current.earnings, payment.gross)?;
    let tax = add("tax_withheld_ytd", current.tax, payment.tax)?;
    let medicare = add("medicare_ytd", current.medicare, payment.medicare)?;
    let super_amount = add("super_ytd", current.super_amount, payment.super_amount)?;

    accrued.salary_ytd = earnings;
    accrued.tax_withheld_ytd = Some(tax);
    accrued.medicare_ytd = medicare;
    accrued.super_ytd = Some(super_amount);

    Ok(ytd_amounts(accrued, super_guarantee_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditTrace;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn payment() -> PeriodAmounts {
        PeriodAmounts {
            financial_year: "2024-25".to_string(),
            pay_frequency: Default::default(),
            gross: dec("2307.69"),
            tax: dec("380.31"),
            medicare: dec("46.15"),
            net: dec("1927.38"),
            super_amount: dec("265.38"),
            hourly_rate: dec("30.36"),
            hours: dec("76"),
            audit_trace: AuditTrace::default(),
        }
    }

    #[test]
    fn test_legacy_tax_and_derived_super() {
        let accrued = AccruedEmployment {
            salary_ytd: dec("10000"),
            tax_withheld: dec("1500"),
            ..AccruedEmployment::default()
        };
        let ytd = ytd_amounts(&accrued, dec("0.115"));
        assert_eq!(ytd.tax, dec("1500"));
        assert_eq!(ytd.super_amount, dec("1150"));
    }

    #[test]
    fn test_recorded_figures_win() {
        let accrued = AccruedEmployment {
            salary_ytd: dec("10000"),
            tax_withheld: dec("1500"),
            tax_withheld_ytd: Some(dec("1650")),
            super_ytd: Some(dec("1100")),
            ..AccruedEmployment::default()
        };
        let ytd = ytd_amounts(&accrued, dec("0.115"));
        assert_eq!(ytd.tax, dec("1650"));
        assert_eq!(ytd.super_amount, dec("1100"));
    }

    #[test]
    fn test_record_payment_accumulates() {
        let mut accrued = AccruedEmployment::default();
        record_payment(&mut accrued, &payment(), dec("0.115")).unwrap();
        let ytd = record_payment(&mut accrued, &payment(), dec("0.115")).unwrap();

        assert_eq!(ytd.earnings, dec("4615.38"));
        assert_eq!(ytd.tax, dec("760.62"));
        assert_eq!(ytd.medicare, dec("92.30"));
        assert_eq!(ytd.super_amount, dec("530.76"));
        assert_eq!(accrued.tax_withheld_ytd, Some(dec("760.62")));
    }

    #[test]
    fn test_record_payment_overflow_leaves_record() {
        let mut accrued = AccruedEmployment {
            salary_ytd: dec("10000"),
            medicare_ytd: Decimal::MAX,
            ..AccruedEmployment::default()
        };
        let result = record_payment(&mut accrued, &payment(), dec("0.115"));
        assert!(matches!(
            result,
            Err(EngineError::Validation { ref field, .. }) if field == "medicare_ytd"
        ));
        assert_eq!(accrued.salary_ytd, dec("10000"));
        assert_eq!(accrued.tax_withheld_ytd, None);
    }
}
