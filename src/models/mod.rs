//! Core data models for the Repertoire engine.
//!
//! This module contains the business, employee and roster records along with
//! the small vocabularies (states, work areas, leave types) they are built from.

mod audit;
mod business;
mod employee;
mod leave;
mod roster;
mod state;
mod work_area;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use business::{
    Address, BusinessEntity, ContactDetails, EntityProfile, EntityType, HeadOffice, Venue,
    VenueLocation, WorkArea, is_valid_phone,
};
pub use employee::{
    AccruedEmployment, BusinessUser, EmploymentDetails, EmploymentType, FULL_TIME_HOURS,
    LeaveBalance, LeaveEntitlements, PayRate, PayType, UserStatus,
};
pub use leave::LeaveType;
pub use roster::{EmployeeWeek, Roster, Shift, ShiftStatus, ShiftUpdate, WeekRoster};
pub use state::AustralianState;
pub use work_area::WorkAreaKind;
