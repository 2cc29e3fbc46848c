//! Request bodies for the engine API.
//!
//! Identifiers that the handlers must parse arrive as plain strings so that a
//! malformed ID is reported as `INVALID_ID` rather than as malformed JSON.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::calculation::{FinancialYear, PayslipRequest, PeriodRequest};
use crate::identity::{EmployeeIdRecord, IdKind};
use crate::models::{BusinessEntity, BusinessUser, EmploymentDetails, LeaveEntitlements, LeaveType};
use crate::permissions::PermissionContext;

/// Body of `POST /payroll/period-amounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAmountsRequest {
    /// Salary, frequency, residency and Medicare options.
    #[serde(flatten)]
    pub period: PeriodRequest,
    /// Rates to apply; the latest configured year when absent.
    #[serde(default)]
    pub financial_year: Option<FinancialYear>,
}

/// Body of `POST /payroll/payslip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipApiRequest {
    /// The employee being paid.
    pub user: BusinessUser,
    /// The pay run.
    #[serde(flatten)]
    pub pay_run: PayslipRequest,
}

/// Body of `POST /payroll/payroll-tax`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PayrollTaxRequest {
    /// Annual taxable wages.
    pub wages: Decimal,
    /// State or territory code.
    #[validate(length(min = 2, max = 3, message = "must be a state or territory code"))]
    pub state: String,
}

/// Body of `POST /leave/accrual`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveAccrualRequest {
    /// Terms of employment; supplies the FTE, service start and state.
    pub employment_details: EmploymentDetails,
    /// The leave type to accrue.
    pub leave_type: LeaveType,
    /// Date service is measured to.
    pub as_of: NaiveDate,
}

/// Body of `POST /leave/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveSummaryRequest {
    /// Terms of employment.
    pub employment_details: EmploymentDetails,
    /// Recorded balances.
    #[serde(default)]
    pub leave_entitlements: LeaveEntitlements,
    /// Date the summary is made at.
    pub as_of: NaiveDate,
}

/// Body of `POST /ids/generate`, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerateIdRequest {
    /// A new company ID.
    Company,
    /// The next venue of a company.
    Venue {
        /// Owning company.
        company_id: String,
    },
    /// The next work area of a venue.
    WorkArea {
        /// Owning company.
        company_id: String,
        /// Owning venue.
        venue_id: String,
    },
    /// The next employee linking ID in a work area.
    Linking {
        /// Employing company.
        company_id: String,
        /// The employee's work area.
        work_area_id: String,
    },
    /// The next payroll ID for a work area name.
    Payroll {
        /// Work area name, e.g. `kitchen`.
        work_area: String,
    },
    /// The next request ID for a day.
    Request {
        /// The day; today when absent.
        #[serde(default)]
        date: Option<NaiveDate>,
    },
}

/// Body of `POST /ids/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateIdRequest {
    /// Which format to check against.
    pub kind: IdKind,
    /// The candidate identifier.
    pub value: String,
}

/// Body of `POST /ids/payroll-check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollCheckRequest {
    /// Employee records to check.
    pub records: Vec<EmployeeIdRecord>,
}

/// Body of `POST /ids/auto-correct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCorrectRequest {
    /// The record to repair.
    pub record: EmployeeIdRecord,
}

/// Body of `POST /acn/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcnRequest {
    /// Nine digits, spaces allowed.
    pub acn: String,
}

/// Body of `POST /business/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessValidateRequest {
    /// The entity to check.
    pub business: BusinessEntity,
}

/// Body of `POST /permissions/check`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PermissionCheckRequest {
    /// The user to check.
    pub user_id: String,
    /// The permission required.
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub permission: String,
    /// Where it is required.
    #[serde(default)]
    pub context: PermissionContext,
}

/// Body of `POST /permissions/effective`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EffectivePermissionsRequest {
    /// The user to list.
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub user_id: String,
    /// Where to list them.
    #[serde(default)]
    pub context: PermissionContext,
}

/// Body of `POST /permissions/assign`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignRoleRequest {
    /// The user receiving the role.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub user_id: String,
    /// The role to assign.
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub role: String,
    /// Where the role applies.
    #[serde(default)]
    pub context: PermissionContext,
    /// Who is assigning it.
    #[serde(default)]
    pub assigned_by: Option<String>,
}

/// Body of `POST /permissions/remove`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoveRoleRequest {
    /// The user losing the role.
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub user_id: String,
    /// Where the role was assigned.
    #[serde(default)]
    pub context: PermissionContext,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Payroll ID.
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub payroll_id: String,
    /// Password.
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub password: String,
}
