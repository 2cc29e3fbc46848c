//! Superannuation guarantee.

use rust_decimal::Decimal;

use crate::models::AuditStep;

use super::round_cents;

/// The result of a superannuation calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct SuperResult {
    /// The contribution, rounded to cents.
    pub amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the superannuation guarantee on a gross payment.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::calculate_superannuation;
/// use rust_decimal::Decimal;
///
/// let result = calculate_superannuation(Decimal::from(1_000), Decimal::new(115, 3), 1);
/// assert_eq!(result.amount, Decimal::new(11_500, 2));
/// ```
pub fn calculate_superannuation(gross: Decimal, rate: Decimal, step_number: u32) -> SuperResult {
    let amount = round_cents(gross * rate);

    SuperResult {
        amount,
        audit_step: AuditStep {
            step_number,
            rule_id: "superannuation".to_string(),
            rule_name: "Superannuation Guarantee".to_string(),
            reference: "super_guarantee_rate".to_string(),
            input: serde_json::json!({
                "gross": gross.to_string(),
                "rate": rate.normalize().to_string()
            }),
            output: serde_json::json!({ "super": amount.to_string() }),
            reasoning: format!("${} x {} = ${}", gross, rate.normalize(), amount),
        },
    }
}
