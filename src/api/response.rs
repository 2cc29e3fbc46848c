//! Response bodies and error mapping for the engine API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::identity::{Corrections, EmployeeIdRecord, IdKind};
use crate::models::{EntityProfile, EntityType};
use crate::permissions::Scope;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

fn classify(error: &EngineError) -> (StatusCode, &'static str) {
    match error {
        EngineError::ConfigNotFound { .. }
        | EngineError::ConfigParseError { .. }
        | EngineError::InvalidSetting { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        EngineError::InvalidId { .. } => (StatusCode::BAD_REQUEST, "INVALID_ID"),
        EngineError::UnknownWorkArea { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_WORK_AREA"),
        EngineError::InvalidAcn { .. } => (StatusCode::BAD_REQUEST, "INVALID_ACN"),
        EngineError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        EngineError::InvalidStateCode { .. } => (StatusCode::BAD_REQUEST, "INVALID_STATE_CODE"),
        EngineError::StateConfigNotFound { .. } => {
            (StatusCode::BAD_REQUEST, "STATE_NOT_CONFIGURED")
        }
        EngineError::InvalidRole { .. } => (StatusCode::BAD_REQUEST, "INVALID_ROLE"),
        EngineError::PasswordPolicy { .. } => (StatusCode::BAD_REQUEST, "PASSWORD_POLICY"),
        EngineError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "AUTH_FAILED"),
        EngineError::PermissionDenied { .. } => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        EngineError::AccountInactive { .. } => (StatusCode::FORBIDDEN, "ACCOUNT_INACTIVE"),
        EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        EngineError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
        EngineError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        EngineError::IdGeneration { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ID_GENERATION_ERROR")
        }
        EngineError::PasswordHash { .. } | EngineError::Storage { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
        EngineError::CalculationError { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "CALCULATION_ERROR")
        }
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let (status, code) = classify(&error);
        let error = match error {
            // Internal failures keep their detail out of the message.
            EngineError::PasswordHash { message } | EngineError::Storage { message } => {
                ApiError::with_details(code, "Internal error", message)
            }
            EngineError::PasswordPolicy { violations } => ApiError::with_details(
                code,
                "Password does not meet policy",
                violations.join("; "),
            ),
            EngineError::RateLimited {
                retry_after_secs, ..
            } => ApiError::with_details(
                code,
                "Too many failed attempts",
                format!("Retry in {} seconds", retry_after_secs),
            ),
            other => ApiError::new(code, other.to_string()),
        };
        ApiErrorResponse { status, error }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Financial years with loaded rates.
    pub financial_years: Vec<String>,
}

/// Body returned by `POST /ids/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedIdResponse {
    /// The format generated.
    pub kind: IdKind,
    /// The new identifier.
    pub id: String,
}

/// Body returned by `POST /ids/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdValidationResponse {
    /// The format checked.
    pub kind: IdKind,
    /// The candidate as given.
    pub value: String,
    /// Whether it matches.
    pub valid: bool,
    /// The pattern it was checked against.
    pub pattern: String,
}

/// Body returned by `POST /ids/auto-correct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCorrectResponse {
    /// The record after correction.
    pub record: EmployeeIdRecord,
    /// What was changed.
    pub corrections: Corrections,
}

/// Body returned by `POST /acn/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcnResponse {
    /// The ACN as given.
    pub acn: String,
    /// Whether it passes the checksum.
    pub valid: bool,
    /// `NNN NNN NNN` form when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Why it failed, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body returned by `POST /business/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessValidationResponse {
    /// The company checked.
    pub company_id: String,
    /// The derived shape of the business.
    pub profile: EntityProfile,
    /// The declared type, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<EntityType>,
}

/// Body returned by `POST /permissions/check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckResponse {
    /// The user checked.
    pub user_id: String,
    /// The permission checked.
    pub permission: String,
    /// The scope the context resolved to.
    pub scope: Scope,
    /// Whether the user holds it.
    pub allowed: bool,
}

/// Body returned by `POST /permissions/effective`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivePermissionsResponse {
    /// The user listed.
    pub user_id: String,
    /// The scope the context resolved to.
    pub scope: Scope,
    /// Every permission held, sorted.
    pub permissions: Vec<String>,
}

/// Body returned by `POST /permissions/remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRoleResponse {
    /// The user.
    pub user_id: String,
    /// Whether a role was removed.
    pub removed: bool,
}
