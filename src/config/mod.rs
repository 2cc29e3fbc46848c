//! Configuration loading and management for the Repertoire engine.
//!
//! Business rules that change from year to year (tax brackets, Medicare
//! thresholds, leave accrual, payroll tax, the role hierarchy) are loaded from
//! YAML files. Process settings come from the environment.
//!
//! # Example
//!
//! ```no_run
//! use repertoire_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/au").unwrap();
//! println!("Latest financial year: {}", config.latest_tax_year().0);
//! ```

mod loader;
mod settings;
mod types;

pub use loader::ConfigLoader;
pub use settings::Settings;
pub use types::{
    AnnualLeaveHours, LeaveConfig, LitoConfig, LongServiceConfig, LongServiceRule, MedicareConfig,
    MedicareThreshold, PayrollTaxConfig, PayrollTaxRule, PermissionsConfig, RoleDefinition,
    StandardHours, TaxBracket, TaxYearConfig,
};
