//! Per-period pay amounts and rate conversions.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{StandardHours, TaxYearConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditTrace, FULL_TIME_HOURS};

use super::income_tax::{TaxResidency, calculate_income_tax};
use super::medicare::{MedicareProfile, calculate_medicare_levy};
use super::round_cents;
use super::superannuation::calculate_superannuation;

const WEEKS_PER_YEAR: Decimal = Decimal::from_parts(52, 0, 0, false, 0);

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayFrequency {
    /// 52 pays a year.
    Weekly,
    /// 26 pays a year.
    #[default]
    Fortnightly,
    /// 12 pays a year.
    Monthly,
}

impl PayFrequency {
    /// Pay periods in a year.
    pub fn periods_per_year(&self) -> Decimal {
        Decimal::from(match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Fortnightly => 26,
            PayFrequency::Monthly => 12,
        })
    }

    /// Standard ordinary hours in one period.
    pub fn standard_hours(&self, hours: &StandardHours) -> Decimal {
        match self {
            PayFrequency::Weekly => hours.weekly,
            PayFrequency::Fortnightly => hours.fortnightly,
            PayFrequency::Monthly => hours.monthly,
        }
    }
}

impl fmt::Display for PayFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Fortnightly => "fortnightly",
            PayFrequency::Monthly => "monthly",
        })
    }
}

impl FromStr for PayFrequency {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(PayFrequency::Weekly),
            "fortnightly" => Ok(PayFrequency::Fortnightly),
            "monthly" => Ok(PayFrequency::Monthly),
            _ => Err(EngineError::validation(
                "pay_frequency",
                format!("'{}' is not weekly, fortnightly or monthly", s),
            )),
        }
    }
}

/// Inputs to [`calculate_period_amounts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRequest {
    /// Annual salary.
    pub annual_salary: Decimal,
    /// Pay frequency.
    #[serde(default)]
    pub pay_frequency: PayFrequency,
    /// Resident or foreign resident.
    #[serde(default)]
    pub residency: TaxResidency,
    /// Whether the Medicare levy is withheld.
    #[serde(default = "default_true")]
    pub include_medicare: bool,
    /// Medicare levy threshold selection.
    #[serde(default)]
    pub medicare: MedicareProfile,
}

fn default_true() -> bool {
    true
}

impl PeriodRequest {
    /// A resident, individual, fortnightly request.
    pub fn new(annual_salary: Decimal, pay_frequency: PayFrequency) -> Self {
        Self {
            annual_salary,
            pay_frequency,
            residency: TaxResidency::default(),
            include_medicare: true,
            medicare: MedicareProfile::default(),
        }
    }
}

/// Pay amounts for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAmounts {
    /// The financial year whose rates were used.
    pub financial_year: String,
    /// The pay frequency.
    pub pay_frequency: PayFrequency,
    /// Gross pay.
    pub gross: Decimal,
    /// Tax withheld, including the Medicare levy.
    pub tax: Decimal,
    /// The Medicare levy portion of `tax`.
    pub medicare: Decimal,
    /// Gross less tax.
    pub net: Decimal,
    /// Superannuation guarantee contribution.
    #[serde(rename = "super")]
    pub super_amount: Decimal,
    /// Hourly equivalent of the salary over a 38 hour week.
    pub hourly_rate: Decimal,
    /// Standard hours in the period.
    pub hours: Decimal,
    /// How each figure was reached.
    pub audit_trace: AuditTrace,
}

/// Splits an annual salary into per-period gross, tax, net and super.
///
/// Annual income tax and Medicare levy are divided evenly across the
/// periods. Figures are rounded to cents only at the end, so `net` may
/// differ from `gross - tax` by a cent.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::{calculate_period_amounts, PayFrequency, PeriodRequest};
/// use repertoire_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let request = PeriodRequest::new(Decimal::from(60_000), PayFrequency::Fortnightly);
/// let amounts = calculate_period_amounts(
///     &request,
///     config.tax_year("2024-25").unwrap(),
///     &config.leave().standard_hours,
/// )
/// .unwrap();
///
/// assert_eq!(amounts.gross, Decimal::from_str("2307.69").unwrap());
/// assert_eq!(amounts.tax, Decimal::from_str("380.31").unwrap());
/// ```
pub fn calculate_period_amounts(
    request: &PeriodRequest,
    tax_year: &TaxYearConfig,
    standard_hours: &StandardHours,
) -> EngineResult<PeriodAmounts> {
    let start_time = Instant::now();
    let mut trace = AuditTrace::default();

    let annual = request.annual_salary;
    let divisor = request.pay_frequency.periods_per_year();

    let income_tax = calculate_income_tax(
        annual,
        request.residency,
        tax_year,
        trace.next_step_number(),
    )?;
    trace.push(income_tax.audit_step);

    let annual_medicare = if request.include_medicare {
        let medicare = calculate_medicare_levy(
            annual,
            request.residency,
            &request.medicare,
            &tax_year.medicare,
            trace.next_step_number(),
        );
        trace.push(medicare.audit_step);
        medicare.levy
    } else {
        trace.warn(
            "MEDICARE_EXCLUDED",
            "Medicare levy was not withheld for this calculation",
            "low",
        );
        Decimal::ZERO
    };

    let annual_tax = income_tax
        .tax
        .checked_add(annual_medicare)
        .ok_or_else(|| too_large("annual_salary"))?;
    let gross = annual / divisor;
    let tax = annual_tax / divisor;
    let net = gross - tax;
    let medicare = annual_medicare / divisor;

    trace.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "period_split".to_string(),
        rule_name: "Period Split".to_string(),
        reference: "pay_frequency".to_string(),
        input: serde_json::json!({
            "annual_salary": annual.to_string(),
            "annual_tax": income_tax.tax.to_string(),
            "annual_medicare": annual_medicare.normalize().to_string(),
            "pay_frequency": request.pay_frequency.to_string()
        }),
        output: serde_json::json!({
            "gross": round_cents(gross).to_string(),
            "tax": round_cents(tax).to_string(),
            "net": round_cents(net).to_string()
        }),
        reasoning: format!(
            "Annual figures divided by {} {} periods",
            divisor, request.pay_frequency
        ),
    });

    let super_result =
        calculate_superannuation(gross, tax_year.super_guarantee_rate, trace.next_step_number());
    trace.push(super_result.audit_step);

    if annual.is_zero() {
        trace.warn("ZERO_SALARY", "Annual salary is zero", "medium");
    }

    trace.duration_us = start_time.elapsed().as_micros() as u64;

    Ok(PeriodAmounts {
        financial_year: tax_year.financial_year.clone(),
        pay_frequency: request.pay_frequency,
        gross: round_cents(gross),
        tax: round_cents(tax),
        medicare: round_cents(medicare),
        net: round_cents(net),
        super_amount: super_result.amount,
        hourly_rate: round_cents(annual / (WEEKS_PER_YEAR * FULL_TIME_HOURS)),
        hours: request.pay_frequency.standard_hours(standard_hours),
        audit_trace: trace,
    })
}

fn too_large(field: &str) -> EngineError {
    EngineError::validation(field, "is too large to calculate")
}

fn weekly_hours(hours_per_week: Option<Decimal>) -> EngineResult<Decimal> {
    let hours = hours_per_week.unwrap_or(FULL_TIME_HOURS);
    if hours <= Decimal::ZERO {
        return Err(EngineError::validation(
            "hours_per_week",
            "must be greater than zero",
        ));
    }
    Ok(hours)
}

/// Hourly rate for an annual salary, rounded to cents. Hours default to 38.
pub fn hourly_rate(annual_salary: Decimal, hours_per_week: Option<Decimal>) -> EngineResult<Decimal> {
    let hours = weekly_hours(hours_per_week)?;
    let yearly_hours = WEEKS_PER_YEAR
        .checked_mul(hours)
        .ok_or_else(|| too_large("hours_per_week"))?;
    Ok(round_cents(annual_salary / yearly_hours))
}

/// Annual salary for an hourly rate, rounded to cents. Hours default to 38.
pub fn annual_salary(hourly_rate: Decimal, hours_per_week: Option<Decimal>) -> EngineResult<Decimal> {
    let hours = weekly_hours(hours_per_week)?;
    hourly_rate
        .checked_mul(hours)
        .and_then(|weekly| weekly.checked_mul(WEEKS_PER_YEAR))
        .map(round_cents)
        .ok_or_else(|| too_large("hourly_rate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn amounts(request: PeriodRequest) -> PeriodAmounts {
        let config = ConfigLoader::load("./config/au").unwrap();
        calculate_period_amounts(
            &request,
            config.tax_year("2024-25").unwrap(),
            &config.leave().standard_hours,
        )
        .unwrap()
    }

    #[test]
    fn test_fortnightly_60k() {
        let result = amounts(PeriodRequest::new(dec("60000"), PayFrequency::Fortnightly));
        assert_eq!(result.gross, dec("2307.69"));
        assert_eq!(result.tax, dec("380.31"));
        assert_eq!(result.medicare, dec("46.15"));
        assert_eq!(result.net, dec("1927.38"));
        assert_eq!(result.super_amount, dec("265.38"));
        assert_eq!(result.hourly_rate, dec("30.36"));
        assert_eq!(result.hours, dec("76"));
        assert_eq!(result.financial_year, "2024-25");
    }

    #[test]
    fn test_weekly_and_monthly() {
        let weekly = amounts(PeriodRequest::new(dec("52000"), PayFrequency::Weekly));
        assert_eq!(weekly.gross, dec("1000"));
        assert_eq!(weekly.hours, dec("38"));

        let monthly = amounts(PeriodRequest::new(dec("60000"), PayFrequency::Monthly));
        assert_eq!(monthly.gross, dec("5000"));
        // (8688 + 1200) / 12
        assert_eq!(monthly.tax, dec("824"));
        assert_eq!(monthly.hours, dec("164.67"));
    }

    #[test]
    fn test_excluding_medicare_warns() {
        let mut request = PeriodRequest::new(dec("60000"), PayFrequency::Fortnightly);
        request.include_medicare = false;
        let result = amounts(request);
        assert_eq!(result.medicare, Decimal::ZERO);
        // 8688 / 26
        assert_eq!(result.tax, dec("334.15"));
        assert_eq!(result.audit_trace.warnings[0].code, "MEDICARE_EXCLUDED");
    }

    #[test]
    fn test_audit_trace_is_sequential() {
        let result = amounts(PeriodRequest::new(dec("60000"), PayFrequency::Fortnightly));
        let rules: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(rules, ["income_tax", "medicare_levy", "period_split", "superannuation"]);
        for (i, step) in result.audit_trace.steps.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
    }

    #[test]
    fn test_negative_salary_is_rejected() {
        let config = ConfigLoader::load("./config/au").unwrap();
        let request = PeriodRequest::new(dec("-1"), PayFrequency::Weekly);
        assert!(
            calculate_period_amounts(
                &request,
                config.tax_year("2024-25").unwrap(),
                &config.leave().standard_hours
            )
            .is_err()
        );
    }

    #[test]
    fn test_rate_conversions() {
        assert_eq!(hourly_rate(dec("60000"), None).unwrap(), dec("30.36"));
        assert_eq!(hourly_rate(dec("31200"), Some(dec("20"))).unwrap(), dec("30"));
        assert_eq!(annual_salary(dec("30"), None).unwrap(), dec("59280"));
        assert!(hourly_rate(dec("60000"), Some(Decimal::ZERO)).is_err());
        assert!(annual_salary(Decimal::MAX, None).is_err());
        assert!(hourly_rate(dec("60000"), Some(Decimal::MAX)).is_err());
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("Weekly".parse::<PayFrequency>().unwrap(), PayFrequency::Weekly);
        assert!("daily".parse::<PayFrequency>().is_err());
        let request: PeriodRequest =
            serde_json::from_str(r#"{ "annual_salary": "60000" }"#).unwrap();
        assert_eq!(request.pay_frequency, PayFrequency::Fortnightly);
        assert!(request.include_medicare);
    }
}
