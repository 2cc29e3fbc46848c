//! Identifier formats, generation and correction.
//!
//! Every tenant-scoped record carries a structured identifier whose parts
//! encode its parents: a work area ID names its company and venue, a linking
//! ID names its company and work area, and a payroll ID names its work area.
//! This module validates those formats, generates new IDs from named
//! sequences, and repairs payroll IDs and work emails that drift out of step.

mod acn;
mod correction;
mod formats;
mod generator;

pub use acn::{Acn, validate_acn};
pub use correction::{
    AssignmentIssue, AssignmentReport, Corrections, EmployeeIdRecord, PayrollIdIssue,
    auto_correct, check_payroll_id, check_payroll_id_assignment, correct_payroll_id,
    correct_work_email, extract_area_code, validate_linking_id, validate_payroll_id,
    work_area_from_payroll_id,
};
pub use formats::{CompanyId, IdKind, LinkingId, PayrollId, VenueId, WorkAreaId};
pub use generator::{
    EMPLOYEE_NUMBER_BASE, IdService, MAX_COMPANY_ID_ATTEMPTS, MemorySequenceStore, SequenceStore,
};
