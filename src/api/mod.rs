//! HTTP API for the Repertoire engine.
//!
//! A thin JSON layer over the identifier, payroll, leave, business
//! validation, permission and sign-in operations. Every request is tagged
//! with a correlation ID in the logs, and engine errors map to stable error
//! codes and HTTP statuses.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AcnRequest, AssignRoleRequest, AutoCorrectRequest, BusinessValidateRequest,
    EffectivePermissionsRequest, GenerateIdRequest, LeaveAccrualRequest, LeaveSummaryRequest,
    LoginRequest, PayrollCheckRequest, PayrollTaxRequest, PayslipApiRequest, PeriodAmountsRequest,
    PermissionCheckRequest, RemoveRoleRequest, ValidateIdRequest,
};
pub use response::{
    AcnResponse, ApiError, ApiErrorResponse, AutoCorrectResponse, BusinessValidationResponse,
    EffectivePermissionsResponse, GeneratedIdResponse, HealthResponse, IdValidationResponse,
    PermissionCheckResponse, RemoveRoleResponse,
};
pub use state::AppState;
