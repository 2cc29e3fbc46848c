//! Medicare levy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{MedicareConfig, MedicareThreshold};
use crate::models::AuditStep;

use super::income_tax::TaxResidency;

/// Whether the levy uses individual or family thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    /// Single taxpayer.
    #[default]
    Individual,
    /// Taxpayer with a spouse or dependants.
    Family,
}

/// The taxpayer details that select Medicare levy thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareProfile {
    /// Individual or family.
    #[serde(default)]
    pub family_status: FamilyStatus,
    /// Dependent children. Each raises the family thresholds.
    #[serde(default)]
    pub dependents: u32,
    /// Seniors and pensioners use their own thresholds.
    #[serde(default)]
    pub senior: bool,
}

impl MedicareProfile {
    /// The lower and upper thresholds that apply to this taxpayer.
    ///
    /// Senior status takes precedence over family status.
    pub fn thresholds(&self, config: &MedicareConfig) -> MedicareThreshold {
        if self.senior {
            return config.senior.clone();
        }
        match self.family_status {
            FamilyStatus::Individual => config.individual.clone(),
            FamilyStatus::Family => {
                let extra = config.family_per_child * Decimal::from(self.dependents);
                MedicareThreshold {
                    lower: config.family.lower + extra,
                    upper: config.family.upper + extra,
                }
            }
        }
    }
}

/// The result of a Medicare levy calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct MedicareResult {
    /// The annual levy.
    pub levy: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the annual Medicare levy.
///
/// No levy is payable at or below the lower threshold. Between the
/// thresholds the levy shades in at 10% of the excess; above the upper
/// threshold the full rate applies to the whole income. Foreign residents
/// pay no levy.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::{calculate_medicare_levy, MedicareProfile, TaxResidency};
/// use repertoire_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let medicare = &config.tax_year("2024-25").unwrap().medicare;
///
/// let result = calculate_medicare_levy(
///     Decimal::from(60_000),
///     TaxResidency::Resident,
///     &MedicareProfile::default(),
///     medicare,
///     1,
/// );
/// assert_eq!(result.levy, Decimal::from(1_200));
/// ```
pub fn calculate_medicare_levy(
    income: Decimal,
    residency: TaxResidency,
    profile: &MedicareProfile,
    config: &MedicareConfig,
    step_number: u32,
) -> MedicareResult {
    let thresholds = profile.thresholds(config);

    let (levy, reasoning) = if residency == TaxResidency::NonResident {
        (Decimal::ZERO, "Foreign residents do not pay the Medicare levy".to_string())
    } else if income <= thresholds.lower {
        (
            Decimal::ZERO,
            format!("Income ${} is at or below ${}", income, thresholds.lower),
        )
    } else if income <= thresholds.upper {
        let levy = (income - thresholds.lower) * config.shade_in_rate;
        (
            levy,
            format!(
                "Shading in: (${} - ${}) x {} = ${}",
                income,
                thresholds.lower,
                config.shade_in_rate.normalize(),
                levy.normalize()
            ),
        )
    } else {
        let levy = income * config.levy_rate;
        (
            levy,
            format!(
                "Full levy: ${} x {} = ${}",
                income,
                config.levy_rate.normalize(),
                levy.normalize()
            ),
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "medicare_levy".to_string(),
        rule_name: "Medicare Levy".to_string(),
        reference: "medicare".to_string(),
        input: serde_json::json!({
            "income": income.to_string(),
            "residency": residency.to_string(),
            "family_status": profile.family_status,
            "dependents": profile.dependents,
            "senior": profile.senior
        }),
        output: serde_json::json!({
            "lower_threshold": thresholds.lower.to_string(),
            "upper_threshold": thresholds.upper.to_string(),
            "levy": levy.normalize().to_string()
        }),
        reasoning,
    };

    MedicareResult { levy, audit_step }
}
