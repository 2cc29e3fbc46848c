//! Consistency checks and automatic corrections for employee identifiers.
//!
//! A payroll ID's code letter must match the employee's work area, and the
//! local part of a work email must be the payroll ID. Records imported from
//! spreadsheets often break both rules; these functions detect and repair them.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::WorkAreaKind;

use super::formats::{CompanyId, LinkingId, WorkAreaId};

static PAYROLL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^D([A-Z])-[0-9]{6}$").expect("payroll code pattern is valid")
});

static CORRECTABLE_PAYROLL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^D[A-Z]-([0-9]+)$").expect("correctable payroll pattern is valid")
});

/// Why a payroll ID does not fit an employee's work area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayrollIdIssue {
    /// The record has no payroll ID or no work area.
    MissingFields,
    /// The payroll ID is not `D<letter>-NNNNNN`.
    InvalidFormat(String),
    /// The code letter does not denote any work area.
    UnknownAreaCode(char),
    /// The work area name is not in the vocabulary.
    UnknownWorkArea(String),
    /// The code letter denotes a different work area.
    AreaCodeMismatch {
        /// The area the payroll ID suggests.
        suggested: WorkAreaKind,
        /// The employee's recorded work area.
        work_area: WorkAreaKind,
    },
}

impl fmt::Display for PayrollIdIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayrollIdIssue::MissingFields => write!(f, "Missing payroll_id or work_area_name"),
            PayrollIdIssue::InvalidFormat(id) => write!(f, "Invalid payroll ID format: {}", id),
            PayrollIdIssue::UnknownAreaCode(code) => {
                write!(f, "Unknown area code in payroll ID: {}", code)
            }
            PayrollIdIssue::UnknownWorkArea(name) => write!(f, "Unknown work area: {}", name),
            PayrollIdIssue::AreaCodeMismatch {
                suggested,
                work_area,
            } => write!(
                f,
                "Area code mismatch: ID suggests \"{}\" but work_area is \"{}\"",
                suggested, work_area
            ),
        }
    }
}

/// Extracts the work area code letter from a well-formed payroll ID.
pub fn extract_area_code(payroll_id: &str) -> Option<char> {
    PAYROLL_CODE
        .captures(payroll_id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
}

/// The work area a payroll ID's code letter denotes.
pub fn work_area_from_payroll_id(payroll_id: &str) -> Option<WorkAreaKind> {
    extract_area_code(payroll_id).and_then(WorkAreaKind::from_code)
}

/// Checks that a payroll ID is well formed and matches a work area.
///
/// # Example
///
/// ```
/// use repertoire_engine::identity::{check_payroll_id, PayrollIdIssue};
///
/// assert!(check_payroll_id("DK-100001", "kitchen").is_ok());
/// assert!(matches!(
///     check_payroll_id("DB-100001", "kitchen"),
///     Err(PayrollIdIssue::AreaCodeMismatch { .. })
/// ));
/// ```
pub fn check_payroll_id(payroll_id: &str, work_area_name: &str) -> Result<(), PayrollIdIssue> {
    let code = extract_area_code(payroll_id)
        .ok_or_else(|| PayrollIdIssue::InvalidFormat(payroll_id.to_string()))?;
    let suggested = WorkAreaKind::from_code(code).ok_or(PayrollIdIssue::UnknownAreaCode(code))?;
    let work_area: WorkAreaKind = work_area_name
        .parse()
        .map_err(|_| PayrollIdIssue::UnknownWorkArea(work_area_name.to_string()))?;

    if suggested != work_area {
        return Err(PayrollIdIssue::AreaCodeMismatch {
            suggested,
            work_area,
        });
    }
    Ok(())
}

/// [`check_payroll_id`] as an engine error on the `payroll_id` field.
pub fn validate_payroll_id(payroll_id: &str, work_area_name: &str) -> EngineResult<()> {
    check_payroll_id(payroll_id, work_area_name)
        .map_err(|issue| EngineError::validation("payroll_id", issue.to_string()))
}

/// Validates a linking ID against the company and work area it claims to belong to.
pub fn validate_linking_id(
    linking_id: &str,
    company: &CompanyId,
    work_area: &WorkAreaId,
) -> EngineResult<LinkingId> {
    let id = LinkingId::parse(linking_id)?;

    if id.company_number() != company.number() {
        return Err(EngineError::validation(
            "linking_id",
            format!("{} does not belong to company {}", id, company),
        ));
    }
    if id.work_area_suffix() != work_area.suffix() {
        return Err(EngineError::validation(
            "linking_id",
            format!("{} does not belong to work area {}", id, work_area),
        ));
    }
    if i64::from(id.employee_number()) < super::generator::EMPLOYEE_NUMBER_BASE {
        return Err(EngineError::validation(
            "linking_id",
            format!("employee number in {} is below 100000", id),
        ));
    }
    Ok(id)
}

/// Rewrites a payroll ID's code letter to match the work area.
///
/// Returns the (possibly unchanged) ID and whether it changed. IDs that are
/// not `D<letter>-<digits>` and unknown work areas are returned untouched.
pub fn correct_payroll_id(payroll_id: &str, work_area_name: &str) -> (String, bool) {
    let Ok(work_area) = work_area_name.parse::<WorkAreaKind>() else {
        return (payroll_id.to_string(), false);
    };
    let Some(number) = CORRECTABLE_PAYROLL
        .captures(payroll_id)
        .and_then(|caps| caps.get(1))
    else {
        return (payroll_id.to_string(), false);
    };

    let corrected = format!("D{}-{}", work_area.code(), number.as_str());
    let changed = corrected != payroll_id;
    (corrected, changed)
}

/// Rewrites the local part of a work email to be the payroll ID.
///
/// Returns the (possibly unchanged) email and whether it changed. Emails
/// without an `@` are returned untouched.
pub fn correct_work_email(email: &str, payroll_id: &str) -> (String, bool) {
    let Some((_, domain)) = email.split_once('@') else {
        return (email.to_string(), false);
    };
    let corrected = format!("{}@{}", payroll_id, domain);
    let changed = corrected != email;
    (corrected, changed)
}

/// The identifier fields of an employee record that can be checked or corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeIdRecord {
    /// How the employee is named in reports (name or linking ID).
    pub employee: String,
    /// The payroll ID, if assigned.
    #[serde(default)]
    pub payroll_id: Option<String>,
    /// The work area name, if assigned.
    #[serde(default)]
    pub work_area_name: Option<String>,
    /// The work email, if assigned.
    #[serde(default)]
    pub work_email: Option<String>,
}

/// What [`auto_correct`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corrections {
    /// True if the payroll ID was rewritten.
    pub payroll_id_corrected: bool,
    /// True if the work email was rewritten.
    pub work_email_corrected: bool,
}

impl Corrections {
    /// True if anything changed.
    pub fn any(&self) -> bool {
        self.payroll_id_corrected || self.work_email_corrected
    }
}

/// Corrects a record's payroll ID and then its work email in place.
pub fn auto_correct(record: &mut EmployeeIdRecord) -> Corrections {
    let mut corrections = Corrections::default();

    if let (Some(payroll_id), Some(work_area)) = (&record.payroll_id, &record.work_area_name) {
        let (corrected, changed) = correct_payroll_id(payroll_id, work_area);
        if changed {
            info!(
                employee = %record.employee,
                from = %payroll_id,
                to = %corrected,
                "Corrected payroll ID"
            );
            record.payroll_id = Some(corrected);
            corrections.payroll_id_corrected = true;
        }
    }

    if let (Some(email), Some(payroll_id)) = (&record.work_email, &record.payroll_id) {
        let (corrected, changed) = correct_work_email(email, payroll_id);
        if changed {
            info!(
                employee = %record.employee,
                from = %email,
                to = %corrected,
                "Corrected work email"
            );
            record.work_email = Some(corrected);
            corrections.work_email_corrected = true;
        }
    }

    corrections
}

/// One employee whose payroll ID failed [`check_payroll_id_assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentIssue {
    /// The employee, as named in the record.
    pub employee: String,
    /// What is wrong.
    pub error: String,
}

/// Summary of payroll ID consistency across a set of employees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    /// Records checked.
    pub total: usize,
    /// Records whose payroll ID fits their work area.
    pub correct: usize,
    /// Records with an issue.
    pub incorrect: usize,
    /// One entry per incorrect record.
    pub issues: Vec<AssignmentIssue>,
}

/// Checks every record's payroll ID against its work area.
pub fn check_payroll_id_assignment(records: &[EmployeeIdRecord]) -> AssignmentReport {
    let mut report = AssignmentReport {
        total: records.len(),
        ..AssignmentReport::default()
    };

    for record in records {
        let outcome = match (&record.payroll_id, &record.work_area_name) {
            (Some(payroll_id), Some(work_area)) => check_payroll_id(payroll_id, work_area),
            _ => Err(PayrollIdIssue::MissingFields),
        };

        match outcome {
            Ok(()) => report.correct += 1,
            Err(issue) => {
                report.incorrect += 1;
                report.issues.push(AssignmentIssue {
                    employee: record.employee.clone(),
                    error: issue.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payroll_id: Option<&str>, work_area: Option<&str>) -> EmployeeIdRecord {
        EmployeeIdRecord {
            employee: "Sam Taylor".to_string(),
            payroll_id: payroll_id.map(str::to_string),
            work_area_name: work_area.map(str::to_string),
            work_email: Some("sam.taylor@lerepertoire.com.au".to_string()),
        }
    }

    #[test]
    fn test_extract_area_code() {
        assert_eq!(extract_area_code("DK-100001"), Some('K'));
        assert_eq!(extract_area_code("DK-1001"), None);
        assert_eq!(work_area_from_payroll_id("DG-123456"), Some(WorkAreaKind::GuestServices));
        assert_eq!(work_area_from_payroll_id("DZ-123456"), None);
    }

    #[test]
    fn test_check_payroll_id_reports_each_issue() {
        assert_eq!(
            check_payroll_id("K-100001", "kitchen"),
            Err(PayrollIdIssue::InvalidFormat("K-100001".to_string()))
        );
        assert_eq!(
            check_payroll_id("DZ-100001", "kitchen"),
            Err(PayrollIdIssue::UnknownAreaCode('Z'))
        );
        assert_eq!(
            check_payroll_id("DK-100001", "laundry"),
            Err(PayrollIdIssue::UnknownWorkArea("laundry".to_string()))
        );
        assert_eq!(
            check_payroll_id("DB-100001", "kitchen").unwrap_err().to_string(),
            "Area code mismatch: ID suggests \"bar\" but work_area is \"kitchen\""
        );
    }

    #[test]
    fn test_validate_payroll_id_maps_to_field_error() {
        match validate_payroll_id("DB-100001", "Kitchen") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "payroll_id"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_linking_id() {
        let company = CompanyId::parse("CNY-2976").unwrap();
        let work_area = WorkAreaId::parse("WAI-2976-3087").unwrap();

        assert!(validate_linking_id("EMP-2976-3087-308720", &company, &work_area).is_ok());
        assert!(validate_linking_id("EMP-1111-3087-308720", &company, &work_area).is_err());
        assert!(validate_linking_id("EMP-2976-3088-308720", &company, &work_area).is_err());
        assert!(validate_linking_id("EMP-2976-3087-099999", &company, &work_area).is_err());
        assert!(matches!(
            validate_linking_id("EMP-2976-3087", &company, &work_area),
            Err(EngineError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_correct_payroll_id() {
        assert_eq!(
            correct_payroll_id("DB-100001", "kitchen"),
            ("DK-100001".to_string(), true)
        );
        assert_eq!(
            correct_payroll_id("DK-100001", "kitchen"),
            ("DK-100001".to_string(), false)
        );
        assert_eq!(
            correct_payroll_id("XB-100001", "kitchen"),
            ("XB-100001".to_string(), false)
        );
        assert_eq!(
            correct_payroll_id("DB-100001", "laundry"),
            ("DB-100001".to_string(), false)
        );
    }

    #[test]
    fn test_correct_work_email() {
        assert_eq!(
            correct_work_email("sam@lerepertoire.com.au", "DK-100001"),
            ("DK-100001@lerepertoire.com.au".to_string(), true)
        );
        assert_eq!(
            correct_work_email("DK-100001@lerepertoire.com.au", "DK-100001"),
            ("DK-100001@lerepertoire.com.au".to_string(), false)
        );
        assert!(!correct_work_email("not-an-email", "DK-100001").1);
    }

    #[test]
    fn test_auto_correct_fixes_payroll_then_email() {
        let mut rec = record(Some("DB-100001"), Some("kitchen"));
        let corrections = auto_correct(&mut rec);

        assert!(corrections.payroll_id_corrected);
        assert!(corrections.work_email_corrected);
        assert!(corrections.any());
        assert_eq!(rec.payroll_id.as_deref(), Some("DK-100001"));
        assert_eq!(
            rec.work_email.as_deref(),
            Some("DK-100001@lerepertoire.com.au")
        );
    }

    #[test]
    fn test_check_payroll_id_assignment_counts() {
        let records = vec![
            record(Some("DK-100001"), Some("kitchen")),
            record(Some("DB-100002"), Some("kitchen")),
            record(None, Some("bar")),
            record(Some("DQ-100003"), Some("bar")),
        ];

        let report = check_payroll_id_assignment(&records);

        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 1);
        assert_eq!(report.incorrect, 3);
        assert_eq!(report.issues[1].error, "Missing payroll_id or work_area_name");
        assert_eq!(report.issues[2].error, "Unknown area code in payroll ID: Q");
    }
}
