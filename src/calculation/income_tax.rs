//! Annual income tax.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{TaxBracket, TaxYearConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

use super::lito::calculate_lito;
use super::round_cents;

/// Whether income is taxed at resident or foreign resident rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxResidency {
    /// Australian resident for tax purposes.
    #[default]
    Resident,
    /// Foreign resident. No tax-free threshold, LITO or Medicare levy.
    #[serde(alias = "foreign_resident")]
    NonResident,
}

impl fmt::Display for TaxResidency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxResidency::Resident => "resident",
            TaxResidency::NonResident => "non_resident",
        })
    }
}

/// The result of an income tax calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// Tax from the brackets alone.
    pub bracket_tax: Decimal,
    /// The offset applied. Zero for foreign residents.
    pub lito: Decimal,
    /// Tax payable, rounded to cents.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Tax on `income` from a bracket table, before offsets.
///
/// Uses the highest bracket whose lower bound the income exceeds:
/// `base + (income - over) * rate`.
pub fn bracket_tax(income: Decimal, brackets: &[TaxBracket]) -> Decimal {
    brackets
        .iter()
        .rev()
        .find(|bracket| income > bracket.over)
        .map(|bracket| bracket.base + (income - bracket.over) * bracket.rate)
        .unwrap_or(Decimal::ZERO)
}

/// Calculates annual income tax.
///
/// Residents receive the Low Income Tax Offset; the result is floored at
/// zero and rounded to cents.
///
/// # Errors
///
/// Returns `Validation` if the income is negative.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::{calculate_income_tax, TaxResidency};
/// use repertoire_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let year = config.tax_year("2024-25").unwrap();
///
/// let result = calculate_income_tax(Decimal::from(60_000), TaxResidency::Resident, year, 1).unwrap();
/// assert_eq!(result.tax, Decimal::from(8_688));
/// ```
pub fn calculate_income_tax(
    income: Decimal,
    residency: TaxResidency,
    config: &TaxYearConfig,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    if income < Decimal::ZERO {
        return Err(EngineError::validation(
            "annual_salary",
            "income cannot be negative",
        ));
    }

    let brackets = match residency {
        TaxResidency::Resident => &config.resident_brackets,
        TaxResidency::NonResident => &config.non_resident_brackets,
    };
    let bracket_tax = bracket_tax(income, brackets);
    let lito = match residency {
        TaxResidency::Resident => calculate_lito(income, &config.lito),
        TaxResidency::NonResident => Decimal::ZERO,
    };
    let tax = round_cents((bracket_tax - lito).max(Decimal::ZERO));

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax".to_string(),
        rule_name: "Income Tax".to_string(),
        reference: format!("tax_years/{}.yaml", config.financial_year),
        input: serde_json::json!({
            "income": income.to_string(),
            "residency": residency.to_string(),
            "financial_year": config.financial_year
        }),
        output: serde_json::json!({
            "bracket_tax": bracket_tax.normalize().to_string(),
            "lito": lito.normalize().to_string(),
            "tax": tax.to_string()
        }),
        reasoning: format!(
            "Bracket tax ${} less offset ${} = ${}",
            bracket_tax.normalize(),
            lito.normalize(),
            tax
        ),
    };

    Ok(IncomeTaxResult {
        bracket_tax,
        lito,
        tax,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn year(label: &str) -> TaxYearConfig {
        ConfigLoader::load("./config/au")
            .unwrap()
            .tax_year(label)
            .unwrap()
            .clone()
    }

    fn resident(income: &str, label: &str) -> Decimal {
        calculate_income_tax(dec(income), TaxResidency::Resident, &year(label), 1)
            .unwrap()
            .tax
    }

    #[test]
    fn test_tax_free_threshold() {
        assert_eq!(resident("0", "2024-25"), Decimal::ZERO);
        assert_eq!(resident("18200", "2024-25"), Decimal::ZERO);
    }

    #[test]
    fn test_lito_wipes_out_low_income_tax() {
        // 4288 - 325 at the top of the second bracket, zero below about 22575.
        assert_eq!(resident("22000", "2024-25"), Decimal::ZERO);
        assert_eq!(resident("45000", "2024-25"), dec("3963"));
    }

    #[test]
    fn test_bracket_boundaries_2024_25() {
        assert_eq!(resident("135000", "2024-25"), dec("31288"));
        assert_eq!(resident("190000", "2024-25"), dec("51638"));
        assert_eq!(resident("200000", "2024-25"), dec("56138"));
    }

    #[test]
    fn test_2023_24_rates() {
        // 5092 + 15000 * 0.325 - 100
        assert_eq!(resident("60000", "2023-24"), dec("9867"));
    }

    #[test]
    fn test_non_resident_has_no_threshold_or_offset() {
        let result =
            calculate_income_tax(dec("60000"), TaxResidency::NonResident, &year("2024-25"), 1)
                .unwrap();
        assert_eq!(result.lito, Decimal::ZERO);
        assert_eq!(result.tax, dec("18000"));
    }

    #[test]
    fn test_tax_is_rounded_to_cents() {
        let result =
            calculate_income_tax(dec("50000.55"), TaxResidency::Resident, &year("2024-25"), 1)
                .unwrap();
        // 4288 + 5000.55 * 0.30 = 5788.165; offset 250 - 0.00825
        assert_eq!(result.tax, dec("5538.17"));
    }

    #[test]
    fn test_negative_income_is_rejected() {
        match calculate_income_tax(dec("-1"), TaxResidency::Resident, &year("2024-25"), 1) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "annual_salary"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_step_records_year() {
        let result =
            calculate_income_tax(dec("60000"), TaxResidency::Resident, &year("2024-25"), 3)
                .unwrap();
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "income_tax");
        assert_eq!(result.audit_step.reference, "tax_years/2024-25.yaml");
        assert_eq!(result.audit_step.output["tax"], "8688.00");
    }

    proptest! {
        #[test]
        fn tax_never_decreases_with_income(income in 0u32..400_000, step in 1u32..10_000) {
            let config = year("2024-25");
            let lower = calculate_income_tax(Decimal::from(income), TaxResidency::Resident, &config, 1)
                .unwrap()
                .tax;
            let higher = calculate_income_tax(Decimal::from(income + step), TaxResidency::Resident, &config, 1)
                .unwrap()
                .tax;
            prop_assert!(higher >= lower);
        }
    }
}
