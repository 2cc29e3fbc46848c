//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll, leave
//! and permission rules from YAML files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::calculation::FinancialYear;
use crate::error::{EngineError, EngineResult};
use crate::models::AustralianState;

use super::types::{
    LeaveConfig, LongServiceRule, PayrollTaxConfig, PayrollTaxRule, PermissionsConfig,
    TaxBracket, TaxYearConfig,
};

/// Loads and provides access to the rule configuration.
///
/// # Directory Structure
///
/// ```text
/// config/au/
/// ├── leave.yaml          # Standard hours and leave accrual
/// ├── payroll_tax.yaml    # State payroll tax thresholds
/// ├── permissions.yaml    # Role hierarchy per scope
/// └── tax_years/
///     └── 2024-25.yaml    # Brackets, LITO, Medicare and super for one year
/// ```
///
/// # Example
///
/// ```no_run
/// use repertoire_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/au").unwrap();
/// let year = loader.tax_year("2024-25").unwrap();
/// println!("Super guarantee: {}", year.super_guarantee_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    tax_years: BTreeMap<FinancialYear, TaxYearConfig>,
    latest_year: FinancialYear,
    latest: TaxYearConfig,
    leave: LeaveConfig,
    payroll_tax: PayrollTaxConfig,
    permissions: PermissionsConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Tax brackets are empty or out of order, or a role inherits an undefined role
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let leave = Self::load_yaml::<LeaveConfig>(&path.join("leave.yaml"))?;
        let payroll_tax = Self::load_yaml::<PayrollTaxConfig>(&path.join("payroll_tax.yaml"))?;

        let permissions_path = path.join("permissions.yaml");
        let permissions = Self::load_yaml::<PermissionsConfig>(&permissions_path)?;
        Self::check_permissions(&permissions, &permissions_path)?;

        let tax_years_dir = path.join("tax_years");
        let tax_years = Self::load_tax_years(&tax_years_dir)?;
        let (latest_year, latest) = tax_years
            .iter()
            .next_back()
            .map(|(year, config)| (*year, config.clone()))
            .ok_or_else(|| EngineError::ConfigNotFound {
                path: format!("{} (no tax year files found)", tax_years_dir.display()),
            })?;

        info!(
            path = %path.display(),
            financial_years = tax_years.len(),
            "Loaded rule configuration"
        );

        Ok(Self {
            tax_years,
            latest_year,
            latest,
            leave,
            payroll_tax,
            permissions,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all tax year files from the tax years directory.
    fn load_tax_years(dir: &Path) -> EngineResult<BTreeMap<FinancialYear, TaxYearConfig>> {
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut years = BTreeMap::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let config = Self::load_yaml::<TaxYearConfig>(&path)?;
                let parse_error = |message: String| EngineError::ConfigParseError {
                    path: path.display().to_string(),
                    message,
                };

                let year: FinancialYear = config
                    .financial_year
                    .parse()
                    .map_err(|e: EngineError| parse_error(e.to_string()))?;
                Self::check_brackets(&config.resident_brackets).map_err(parse_error)?;
                Self::check_brackets(&config.non_resident_brackets).map_err(parse_error)?;

                if years.insert(year, config).is_some() {
                    return Err(parse_error(format!("duplicate financial year {}", year)));
                }
            }
        }

        if years.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no tax year files found)", dir_str),
            });
        }

        Ok(years)
    }

    fn check_brackets(brackets: &[TaxBracket]) -> Result<(), String> {
        if brackets.is_empty() {
            return Err("at least one tax bracket is required".to_string());
        }
        if brackets.windows(2).any(|pair| pair[0].over >= pair[1].over) {
            return Err("tax brackets must be in ascending order".to_string());
        }
        Ok(())
    }

    fn check_permissions(config: &PermissionsConfig, path: &Path) -> EngineResult<()> {
        for (scope, roles) in &config.scopes {
            for (role, definition) in roles {
                if let Some(missing) = definition.inherits.iter().find(|r| !roles.contains_key(*r)) {
                    return Err(EngineError::ConfigParseError {
                        path: path.display().to_string(),
                        message: format!(
                            "{} role '{}' inherits undefined role '{}'",
                            scope, role, missing
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Gets the tax settings for a financial year label such as "2024-25".
    ///
    /// Years without a configuration file fall back to the latest configured
    /// year, with a warning. Labels that are not financial years are rejected.
    pub fn tax_year(&self, financial_year: &str) -> EngineResult<&TaxYearConfig> {
        let year: FinancialYear = financial_year.parse()?;
        Ok(self.tax_year_for(year))
    }

    /// Gets the tax settings for a financial year, falling back to the latest.
    pub fn tax_year_for(&self, year: FinancialYear) -> &TaxYearConfig {
        if let Some(config) = self.tax_years.get(&year) {
            return config;
        }

        warn!(
            requested = %year,
            using = %self.latest_year,
            "No tax configuration for financial year, using latest"
        );
        &self.latest
    }

    /// The most recent configured financial year.
    pub fn latest_tax_year(&self) -> (FinancialYear, &TaxYearConfig) {
        (self.latest_year, &self.latest)
    }

    /// All configured financial years, oldest first.
    pub fn financial_years(&self) -> Vec<FinancialYear> {
        self.tax_years.keys().copied().collect()
    }

    /// Returns true if the financial year has its own configuration.
    pub fn has_tax_year(&self, year: FinancialYear) -> bool {
        self.tax_years.contains_key(&year)
    }

    /// Leave settings.
    pub fn leave(&self) -> &LeaveConfig {
        &self.leave
    }

    /// Long service rules for a state, or for the default state when `None`.
    pub fn long_service_rule(
        &self,
        state: Option<AustralianState>,
    ) -> EngineResult<(AustralianState, &LongServiceRule)> {
        self.leave.long_service.rule(state)
    }

    /// Payroll tax rule for a state.
    pub fn payroll_tax_rule(&self, state: AustralianState) -> EngineResult<&PayrollTaxRule> {
        self.payroll_tax
            .states
            .get(&state)
            .ok_or_else(|| EngineError::StateConfigNotFound {
                state: state.to_string(),
                rule: "payroll tax".to_string(),
            })
    }

    /// Role definitions.
    pub fn permissions(&self) -> &PermissionsConfig {
        &self.permissions
    }
}
