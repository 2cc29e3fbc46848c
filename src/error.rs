//! Error types for the Repertoire business rules engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while generating identifiers,
//! validating business data, calculating payroll and checking permissions.

use thiserror::Error;

/// The main error type for the Repertoire engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use repertoire_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A process setting (environment variable) had an unusable value.
    #[error("Invalid setting '{name}': {message}")]
    InvalidSetting {
        /// The setting name.
        name: String,
        /// Why the value was rejected.
        message: String,
    },

    /// An identifier did not match its required format.
    #[error("Invalid {kind} ID format: {value}")]
    InvalidId {
        /// The kind of identifier (e.g. "payroll", "venue").
        kind: String,
        /// The rejected value.
        value: String,
    },

    /// A work area name is not part of the fixed vocabulary.
    #[error("Unknown work area: {name}")]
    UnknownWorkArea {
        /// The unknown name or code.
        name: String,
    },

    /// An Australian Company Number failed format or checksum validation.
    #[error("Invalid ACN '{value}': {message}")]
    InvalidAcn {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// A field failed validation.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A state code is not one of the Australian states and territories.
    #[error("Invalid state code: {code}")]
    InvalidStateCode {
        /// The rejected code.
        code: String,
    },

    /// A valid state has no configuration for the requested calculation.
    #[error("No {rule} configuration for state {state}")]
    StateConfigNotFound {
        /// The state code.
        state: String,
        /// The rule set that was missing (e.g. "payroll tax").
        rule: String,
    },

    /// A role does not exist in the scope it was assigned in.
    #[error("Invalid role '{role}' for {scope} scope")]
    InvalidRole {
        /// The rejected role.
        role: String,
        /// The scope the assignment was attempted in.
        scope: String,
    },

    /// A user lacks a required permission.
    #[error("User '{user_id}' lacks permission '{permission}'")]
    PermissionDenied {
        /// The user that was denied.
        user_id: String,
        /// The permission that was required.
        permission: String,
    },

    /// A record could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record.
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A record with the same identifier already exists.
    #[error("{entity} already exists: {id}")]
    Duplicate {
        /// The kind of record.
        entity: String,
        /// The duplicated identifier.
        id: String,
    },

    /// Credentials were rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The account exists but is not active.
    #[error("Account is inactive: {payroll_id}")]
    AccountInactive {
        /// The payroll ID of the inactive account.
        payroll_id: String,
    },

    /// Too many failed attempts for a key.
    #[error("Too many attempts for '{key}', retry in {retry_after_secs}s")]
    RateLimited {
        /// The rate-limited key.
        key: String,
        /// Seconds until the block expires.
        retry_after_secs: u64,
    },

    /// A password does not satisfy the password policy.
    #[error("Password does not meet policy: {}", violations.join(", "))]
    PasswordPolicy {
        /// Every rule the password violated.
        violations: Vec<String>,
    },

    /// Password hashing or hash parsing failed.
    #[error("Password hash error: {message}")]
    PasswordHash {
        /// A description of the failure.
        message: String,
    },

    /// An identifier could not be generated.
    #[error("Failed to generate {kind} ID: {message}")]
    IdGeneration {
        /// The kind of identifier.
        kind: String,
        /// Why generation failed.
        message: String,
    },

    /// A storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Builds a [`EngineError::Validation`] for a field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a [`EngineError::InvalidId`] for an identifier kind.
    pub fn invalid_id(kind: impl Into<String>, value: impl Into<String>) -> Self {
        EngineError::InvalidId {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                (field.to_string(), message)
            })
            .collect();
        fields.sort();

        match fields.into_iter().next() {
            Some((field, message)) => EngineError::Validation { field, message },
            None => EngineError::Validation {
                field: "record".to_string(),
                message: errors.to_string(),
            },
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_invalid_id_displays_kind_and_value() {
        let error = EngineError::invalid_id("payroll", "DK-12");
        assert_eq!(error.to_string(), "Invalid payroll ID format: DK-12");
    }

    #[test]
    fn test_password_policy_lists_violations() {
        let error = EngineError::PasswordPolicy {
            violations: vec!["too short".to_string(), "missing digit".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Password does not meet policy: too short, missing digit"
        );
    }

    #[test]
    fn test_state_config_not_found_displays_rule() {
        let error = EngineError::StateConfigNotFound {
            state: "VIC".to_string(),
            rule: "payroll tax".to_string(),
        };
        assert_eq!(error.to_string(), "No payroll tax configuration for state VIC");
    }

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 2, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_convert_to_field_error() {
        let errors = Named {
            name: "x".to_string(),
        }
        .validate()
        .unwrap_err();

        match EngineError::from(errors) {
            EngineError::Validation { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "too short");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::NotFound {
                entity: "Venue".to_string(),
                id: "VEN-2976-30".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
