//! Employee (business user) model and related types.
//!
//! A [`BusinessUser`] is an employee of one company, placed in one venue and
//! work area. Its identifiers must agree with that placement: the payroll ID
//! code letter names the work area, the work email is the payroll ID at the
//! company domain, and the linking ID repeats the company and work area.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EngineError, EngineResult};
use crate::identity::{
    CompanyId, IdKind, LinkingId, PayrollId, VenueId, WorkAreaId, validate_linking_id,
    validate_payroll_id,
};

use super::leave::LeaveType;
use super::state::AustralianState;
use super::work_area::WorkAreaKind;

/// Ordinary hours in a full-time week.
pub const FULL_TIME_HOURS: Decimal = Decimal::from_parts(38, 0, 0, false, 0);

/// Largest pay rate of any kind an employee record may carry.
pub const MAX_PAY_RATE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    /// Full-time employment (38 hours per week).
    #[serde(rename = "full time", alias = "full_time", alias = "full-time")]
    FullTime,
    /// Part-time employment (fewer regular hours).
    #[serde(rename = "part time", alias = "part_time", alias = "part-time")]
    PartTime,
    /// Casual employment (no leave accrual).
    #[serde(rename = "casual")]
    Casual,
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmploymentType::FullTime => "full time",
            EmploymentType::PartTime => "part time",
            EmploymentType::Casual => "casual",
        })
    }
}

/// How an employee's pay is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    /// An annual salary.
    #[default]
    Salary,
    /// An hourly rate.
    Hourly,
}

/// Pay rates as recorded. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRate {
    /// Annual salary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_annum_rate: Option<Decimal>,
    /// Pay per fortnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fortnight_rate: Option<Decimal>,
    /// Pay per month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<Decimal>,
    /// Pay per hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
}

impl PayRate {
    /// Checks every recorded rate lies between 0 and [`MAX_PAY_RATE`].
    pub fn ensure_valid(&self) -> EngineResult<()> {
        let rates = [
            ("pay_rate.per_annum_rate", self.per_annum_rate),
            ("pay_rate.fortnight_rate", self.fortnight_rate),
            ("pay_rate.monthly_rate", self.monthly_rate),
            ("pay_rate.hourly_rate", self.hourly_rate),
        ];
        for (field, rate) in rates {
            if let Some(rate) = rate {
                if rate < Decimal::ZERO || rate > MAX_PAY_RATE {
                    return Err(EngineError::validation(
                        field,
                        format!("{} is not between 0 and {}", rate, MAX_PAY_RATE),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Terms of employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentDetails {
    /// First day of employment.
    pub hired_date: NaiveDate,
    /// Full time, part time or casual.
    pub employment_type: EmploymentType,
    /// Salary or hourly.
    #[serde(default)]
    pub pay_type: PayType,
    /// Recorded pay rates.
    #[serde(default)]
    pub pay_rate: PayRate,
    /// Contracted weekly hours. Defaults to 38.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<Decimal>,
    /// The state whose long service rules apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_state: Option<AustralianState>,
    /// Last day of employment, if terminated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    /// Why employment ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

impl EmploymentDetails {
    /// Contracted weekly hours, or 38 when none are recorded.
    pub fn hours_per_week(&self) -> Decimal {
        self.hours_per_week.unwrap_or(FULL_TIME_HOURS)
    }

    /// Full-time equivalent used for leave accrual.
    ///
    /// Full time is 1, casual is 0, and part time is the share of a 38 hour
    /// week, capped at 1.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use repertoire_engine::models::{EmploymentDetails, EmploymentType, PayRate, PayType};
    /// use rust_decimal::Decimal;
    ///
    /// let details = EmploymentDetails {
    ///     hired_date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
    ///     employment_type: EmploymentType::PartTime,
    ///     pay_type: PayType::Hourly,
    ///     pay_rate: PayRate::default(),
    ///     hours_per_week: Some(Decimal::from(19)),
    ///     work_state: None,
    ///     termination_date: None,
    ///     termination_reason: None,
    /// };
    /// assert_eq!(details.fte(), Decimal::new(5, 1));
    /// ```
    pub fn fte(&self) -> Decimal {
        match self.employment_type {
            EmploymentType::FullTime => Decimal::ONE,
            EmploymentType::Casual => Decimal::ZERO,
            EmploymentType::PartTime => (self.hours_per_week() / FULL_TIME_HOURS).min(Decimal::ONE),
        }
    }

    /// Annual salary from whichever rate is recorded, or `None` without one.
    ///
    /// Per-annum wins, then fortnightly × 26, monthly × 12, and hourly ×
    /// weekly hours × 52.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the product does not fit a decimal.
    pub fn annual_salary(&self) -> EngineResult<Option<Decimal>> {
        let rate = &self.pay_rate;
        let annual = if let Some(per_annum) = rate.per_annum_rate {
            Some(per_annum)
        } else if let Some(fortnight) = rate.fortnight_rate {
            fortnight.checked_mul(Decimal::from(26))
        } else if let Some(monthly) = rate.monthly_rate {
            monthly.checked_mul(Decimal::from(12))
        } else if let Some(hourly) = rate.hourly_rate {
            hourly
                .checked_mul(self.hours_per_week())
                .and_then(|weekly| weekly.checked_mul(Decimal::from(52)))
        } else {
            return Ok(None);
        };

        annual.map(Some).ok_or_else(|| {
            EngineError::validation("pay_rate", "annual salary is too large to calculate")
        })
    }

    /// Whole days between the hired date and `as_of`, never negative.
    pub fn days_employed(&self, as_of: NaiveDate) -> i64 {
        let end = self
            .termination_date
            .map(|t| t.min(as_of))
            .unwrap_or(as_of);
        (end - self.hired_date).num_days().max(0)
    }

    /// Checks pay rates, hours and dates.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.pay_rate.ensure_valid()?;
        if let Some(hours) = self.hours_per_week {
            if hours <= Decimal::ZERO || hours > Decimal::from(168) {
                return Err(EngineError::validation(
                    "hours_per_week",
                    format!("{} is not between 0 and 168", hours),
                ));
            }
        }
        if let Some(termination) = self.termination_date {
            if termination < self.hired_date {
                return Err(EngineError::validation(
                    "termination_date",
                    "cannot be before the hired date",
                ));
            }
        }
        Ok(())
    }
}

/// Hours accrued and taken for one leave type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Hours accrued to date.
    #[serde(default)]
    pub accrued: Decimal,
    /// Hours taken to date.
    #[serde(default)]
    pub taken: Decimal,
}

impl LeaveBalance {
    /// Accrued less taken.
    pub fn remaining(&self) -> Decimal {
        self.accrued - self.taken
    }
}

/// Leave balances per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveEntitlements {
    /// Annual leave.
    #[serde(default, alias = "holiday")]
    pub annual: LeaveBalance,
    /// Sick leave.
    #[serde(default)]
    pub sick: LeaveBalance,
    /// Personal/carer's leave.
    #[serde(default)]
    pub carers: LeaveBalance,
    /// Bereavement leave.
    #[serde(default)]
    pub bereavement: LeaveBalance,
    /// Long service leave taken. Accrual is derived from service.
    #[serde(default)]
    pub long_service_taken: Decimal,
    /// Maternity leave entitlement.
    #[serde(default)]
    pub maternity_entitlement: Decimal,
    /// Maternity leave taken.
    #[serde(default)]
    pub maternity_taken: Decimal,
    /// Unpaid leave taken.
    #[serde(default)]
    pub unpaid_leave_taken: Decimal,
}

impl LeaveEntitlements {
    /// The stored balance for an accruing leave type. Long service has none.
    pub fn balance(&self, leave_type: LeaveType) -> Option<&LeaveBalance> {
        match leave_type {
            LeaveType::Annual => Some(&self.annual),
            LeaveType::Sick => Some(&self.sick),
            LeaveType::Carers => Some(&self.carers),
            LeaveType::Bereavement => Some(&self.bereavement),
            LeaveType::LongService => None,
        }
    }

    /// Mutable access to an accruing leave type's balance.
    pub fn balance_mut(&mut self, leave_type: LeaveType) -> Option<&mut LeaveBalance> {
        match leave_type {
            LeaveType::Annual => Some(&mut self.annual),
            LeaveType::Sick => Some(&mut self.sick),
            LeaveType::Carers => Some(&mut self.carers),
            LeaveType::Bereavement => Some(&mut self.bereavement),
            LeaveType::LongService => None,
        }
    }

    /// Hours taken of any leave type.
    pub fn taken(&self, leave_type: LeaveType) -> Decimal {
        self.balance(leave_type)
            .map(|b| b.taken)
            .unwrap_or(self.long_service_taken)
    }

    /// Records leave taken. Negative hours are rejected.
    pub fn record_taken(&mut self, leave_type: LeaveType, hours: Decimal) -> EngineResult<()> {
        if hours < Decimal::ZERO {
            return Err(EngineError::validation("hours", "cannot be negative"));
        }
        match self.balance_mut(leave_type) {
            Some(balance) => balance.taken += hours,
            None => self.long_service_taken += hours,
        }
        Ok(())
    }

    /// Fails if any recorded figure is negative.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        for leave_type in LeaveType::STANDARD {
            if let Some(balance) = self.balance(leave_type) {
                if balance.accrued < Decimal::ZERO || balance.taken < Decimal::ZERO {
                    return Err(EngineError::validation(
                        "leave_entitlements",
                        format!("{} hours cannot be negative", leave_type.display_name()),
                    ));
                }
            }
        }
        let others = [
            self.long_service_taken,
            self.maternity_entitlement,
            self.maternity_taken,
            self.unpaid_leave_taken,
        ];
        if others.iter().any(|v| *v < Decimal::ZERO) {
            return Err(EngineError::validation(
                "leave_entitlements",
                "leave hours cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Service and year-to-date pay figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccruedEmployment {
    /// Days since the hired date, as last refreshed.
    #[serde(default)]
    pub days_employed: i64,
    /// Gross earnings this financial year.
    #[serde(default)]
    pub salary_ytd: Decimal,
    /// Tax withheld, as recorded by older payroll runs.
    #[serde(default)]
    pub tax_withheld: Decimal,
    /// Tax withheld this financial year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_withheld_ytd: Option<Decimal>,
    /// Medicare levy withheld this financial year.
    #[serde(default)]
    pub medicare_ytd: Decimal,
    /// Superannuation paid this financial year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_ytd: Option<Decimal>,
    /// Days of unpaid leave.
    #[serde(default)]
    pub unpaid_leave: Decimal,
}

/// Whether a user can sign in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Current employee.
    #[default]
    Active,
    /// Deactivated.
    Inactive,
}

/// An employee of a tenant business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BusinessUser {
    /// Company-scoped employee ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking_id: Option<LinkingId>,
    /// Payroll ID; also the sign-in name.
    pub payroll_id: PayrollId,
    /// Employing company.
    pub company_id: CompanyId,
    /// Company name.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub company_name: String,
    /// Venue the employee works at.
    pub venue_id: VenueId,
    /// Venue name.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub venue_name: String,
    /// Work area within the venue.
    pub work_area_id: WorkAreaId,
    /// Work area name.
    pub work_area_name: WorkAreaKind,
    /// Role ID, `FOH-XXX-NNN` or `BOH-XXX-NNN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    /// Role title.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub role_name: String,
    /// Given name.
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub last_name: String,
    /// Name the employee goes by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<String>,
    /// `<payroll id>@<company domain>`.
    #[validate(email(message = "must be a valid email address"))]
    pub work_email: String,
    /// Personal email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub personal_email: Option<String>,
    /// Personal phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    /// Terms of employment.
    pub employment_details: EmploymentDetails,
    /// Leave balances.
    #[serde(default)]
    pub leave_entitlements: LeaveEntitlements,
    /// Service and YTD figures.
    #[serde(default)]
    pub accrued_employment: AccruedEmployment,
    /// Active or inactive.
    #[serde(default)]
    pub status: UserStatus,
    /// Permissions granted directly to the user.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Argon2 PHC string.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    /// When the password was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_updated_at: Option<DateTime<Utc>>,
    /// Last successful sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl BusinessUser {
    /// True for active users.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// True for casual employees.
    pub fn is_casual(&self) -> bool {
        self.employment_details.employment_type == EmploymentType::Casual
    }

    /// Preferred name if set, otherwise first name, followed by the last name.
    pub fn display_name(&self) -> String {
        let first = self
            .preferred_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.first_name);
        format!("{} {}", first, self.last_name)
    }

    /// Checks field formats and that the identifiers agree with the placement.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        self.validate()?;

        validate_payroll_id(self.payroll_id.as_str(), self.work_area_name.name())?;

        match self.work_email.split_once('@') {
            Some((local, _)) if local == self.payroll_id.as_str() => {}
            _ => {
                return Err(EngineError::validation(
                    "work_email",
                    format!("local part must be {}", self.payroll_id),
                ));
            }
        }

        if !self.venue_id.belongs_to(&self.company_id) {
            return Err(EngineError::validation(
                "venue_id",
                format!("{} does not belong to {}", self.venue_id, self.company_id),
            ));
        }
        if !self.work_area_id.belongs_to_venue(&self.venue_id) {
            return Err(EngineError::validation(
                "work_area_id",
                format!(
                    "{} does not belong to venue {}",
                    self.work_area_id, self.venue_id
                ),
            ));
        }
        if let Some(linking_id) = &self.linking_id {
            validate_linking_id(linking_id.as_str(), &self.company_id, &self.work_area_id)?;
        }
        if let Some(role_id) = &self.role_id {
            IdKind::Role.check(role_id)?;
        }

        self.employment_details.ensure_valid()?;
        self.leave_entitlements.ensure_valid()
    }
}
