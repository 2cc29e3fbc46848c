//! State payroll tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AustralianState};

use super::round_cents;

/// The result of a payroll tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTaxResult {
    /// The state taxed in.
    pub state: AustralianState,
    /// Annual taxable wages.
    pub wages: Decimal,
    /// The tax-free threshold applied.
    pub threshold: Decimal,
    /// The rate applied above the threshold.
    pub rate: Decimal,
    /// Payroll tax payable, rounded to cents.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates annual payroll tax for a state.
///
/// Tax is `max(0, wages - threshold) * rate`. State codes are matched
/// case-insensitively.
///
/// # Errors
///
/// Returns `InvalidStateCode` for anything that is not an Australian state
/// or territory, `StateConfigNotFound` for a state without configured rates,
/// and `Validation` for negative wages.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::calculate_payroll_tax;
/// use repertoire_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let result = calculate_payroll_tax(Decimal::from(2_200_000), "nsw", &config).unwrap();
/// assert_eq!(result.tax, Decimal::from(47_500));
/// ```
pub fn calculate_payroll_tax(
    wages: Decimal,
    state_code: &str,
    config: &ConfigLoader,
) -> EngineResult<PayrollTaxResult> {
    let state: AustralianState = state_code.parse()?;
    if wages < Decimal::ZERO {
        return Err(EngineError::validation("wages", "cannot be negative"));
    }
    let rule = config.payroll_tax_rule(state)?;

    let taxable = (wages - rule.threshold).max(Decimal::ZERO);
    let tax = round_cents(taxable * rule.rate);

    let audit_step = AuditStep {
        step_number: 1,
        rule_id: "payroll_tax".to_string(),
        rule_name: "State Payroll Tax".to_string(),
        reference: format!("payroll_tax.yaml#{}", state),
        input: serde_json::json!({
            "wages": wages.to_string(),
            "state": state.code()
        }),
        output: serde_json::json!({
            "taxable": taxable.to_string(),
            "tax": tax.to_string()
        }),
        reasoning: format!(
            "(${} - ${}) x {} = ${}",
            wages,
            rule.threshold,
            rule.rate.normalize(),
            tax
        ),
    };

    Ok(PayrollTaxResult {
        state,
        wages,
        threshold: rule.threshold,
        rate: rule.rate,
        tax,
        audit_step,
    })
}
