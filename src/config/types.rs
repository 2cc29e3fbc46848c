//! Configuration types for the payroll, leave and permission rules.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::AustralianState;
use crate::permissions::Scope;

/// One marginal income tax bracket.
///
/// Income above `over` is taxed at `rate` on top of `base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// The exclusive lower bound of the bracket.
    pub over: Decimal,
    /// Tax payable on income up to `over`.
    pub base: Decimal,
    /// The marginal rate within the bracket.
    pub rate: Decimal,
}

/// Low Income Tax Offset parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LitoConfig {
    /// The full offset.
    pub max_offset: Decimal,
    /// Income up to which the full offset applies.
    pub full_offset_threshold: Decimal,
    /// Income at which the second taper begins.
    pub first_taper_threshold: Decimal,
    /// Reduction per dollar between the two thresholds.
    pub first_taper_rate: Decimal,
    /// Reduction per dollar above the first taper threshold.
    pub second_taper_rate: Decimal,
}

/// A Medicare levy low-income threshold pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareThreshold {
    /// No levy at or below this income.
    pub lower: Decimal,
    /// Full levy above this income; shaded in between.
    pub upper: Decimal,
}

/// Medicare levy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareConfig {
    /// The full levy rate.
    pub levy_rate: Decimal,
    /// The rate applied to income above the lower threshold while shading in.
    pub shade_in_rate: Decimal,
    /// Thresholds for individuals.
    pub individual: MedicareThreshold,
    /// Thresholds for families before dependants.
    pub family: MedicareThreshold,
    /// Added to both family thresholds for each dependent child.
    pub family_per_child: Decimal,
    /// Thresholds for seniors and pensioners.
    pub senior: MedicareThreshold,
}

/// All tax settings for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    /// The financial year label, e.g. "2024-25".
    pub financial_year: String,
    /// The superannuation guarantee rate.
    pub super_guarantee_rate: Decimal,
    /// Brackets for Australian residents, ascending.
    pub resident_brackets: Vec<TaxBracket>,
    /// Brackets for foreign residents, ascending.
    pub non_resident_brackets: Vec<TaxBracket>,
    /// Low Income Tax Offset.
    pub lito: LitoConfig,
    /// Medicare levy.
    pub medicare: MedicareConfig,
}

/// Standard ordinary hours for each pay frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardHours {
    /// Hours in a week.
    pub weekly: Decimal,
    /// Hours in a fortnight.
    pub fortnightly: Decimal,
    /// Average hours in a month.
    pub monthly: Decimal,
    /// Hours in a year.
    pub annual: Decimal,
}

/// Hours of leave accrued per year at 1.0 FTE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualLeaveHours {
    /// Annual leave.
    pub annual: Decimal,
    /// Sick leave.
    pub sick: Decimal,
    /// Personal/carer's leave.
    pub carers: Decimal,
    /// Bereavement leave.
    pub bereavement: Decimal,
}

/// Long service leave rules for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongServiceRule {
    /// Hours accrued per year of service once eligible.
    pub hours_per_year: Decimal,
    /// Years of continuous service before long service leave accrues.
    pub eligibility_years: u32,
}

/// Long service leave rules across states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongServiceConfig {
    /// The state used when an employee has none recorded.
    pub default_state: AustralianState,
    /// Rules per state.
    pub states: HashMap<AustralianState, LongServiceRule>,
}

impl LongServiceConfig {
    /// The rule for `state`, or for the default state when none is given.
    pub fn rule(
        &self,
        state: Option<AustralianState>,
    ) -> EngineResult<(AustralianState, &LongServiceRule)> {
        let state = state.unwrap_or(self.default_state);
        self.states
            .get(&state)
            .map(|rule| (state, rule))
            .ok_or_else(|| EngineError::StateConfigNotFound {
                state: state.to_string(),
                rule: "long service leave".to_string(),
            })
    }
}

/// Leave configuration file structure.
///
/// Unknown keys are rejected so a rule with no calculation behind it fails
/// to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveConfig {
    /// Standard ordinary hours.
    pub standard_hours: StandardHours,
    /// Accrual runs per year.
    pub accrual_periods_per_year: u32,
    /// Accrual per leave type.
    pub annual_hours: AnnualLeaveHours,
    /// Long service leave.
    pub long_service: LongServiceConfig,
}

/// Payroll tax rule for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTaxRule {
    /// Annual wages exempt from payroll tax.
    pub threshold: Decimal,
    /// Rate applied above the threshold.
    pub rate: Decimal,
}

/// Payroll tax configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTaxConfig {
    /// Rules per configured state.
    pub states: HashMap<AustralianState, PayrollTaxRule>,
}

/// A role within a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Roles whose permissions this role also holds.
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Permissions granted directly.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Permissions configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Role definitions per scope.
    pub scopes: HashMap<Scope, HashMap<String, RoleDefinition>>,
}
