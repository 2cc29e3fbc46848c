//! HTTP request handlers for the engine API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::calculation::{
    LeaveAccrualResult, LeaveSummary, PayrollTaxResult, Payslip, PeriodAmounts,
    calculate_leave_accrual, calculate_payroll_tax, calculate_period_amounts, generate_payslip,
    leave_summary, service_years,
};
use crate::error::{EngineError, EngineResult};
use crate::identity::{
    Acn, AssignmentReport, CompanyId, IdKind, IdService, VenueId, WorkAreaId, auto_correct,
    check_payroll_id_assignment,
};
use crate::models::WorkAreaKind;
use crate::permissions::RoleAssignment;
use crate::security::AuthOutcome;

use super::request::{
    AcnRequest, AssignRoleRequest, AutoCorrectRequest, BusinessValidateRequest,
    EffectivePermissionsRequest, GenerateIdRequest, LeaveAccrualRequest, LeaveSummaryRequest,
    LoginRequest, PayrollCheckRequest, PayrollTaxRequest, PayslipApiRequest,
    PeriodAmountsRequest, PermissionCheckRequest, RemoveRoleRequest, ValidateIdRequest,
};
use super::response::{
    AcnResponse, ApiError, ApiErrorResponse, AutoCorrectResponse, BusinessValidationResponse,
    EffectivePermissionsResponse, GeneratedIdResponse, HealthResponse, IdValidationResponse,
    PermissionCheckResponse, RemoveRoleResponse,
};
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/payroll/period-amounts", post(period_amounts_handler))
        .route("/payroll/payslip", post(payslip_handler))
        .route("/payroll/payroll-tax", post(payroll_tax_handler))
        .route("/leave/accrual", post(leave_accrual_handler))
        .route("/leave/summary", post(leave_summary_handler))
        .route("/ids/generate", post(generate_id_handler))
        .route("/ids/validate", post(validate_id_handler))
        .route("/ids/payroll-check", post(payroll_check_handler))
        .route("/ids/auto-correct", post(auto_correct_handler))
        .route("/acn/validate", post(acn_handler))
        .route("/business/validate", post(business_validate_handler))
        .route("/permissions/check", post(permission_check_handler))
        .route("/permissions/effective", post(effective_permissions_handler))
        .route("/permissions/assign", post(assign_role_handler))
        .route("/permissions/remove", post(remove_role_handler))
        .route("/auth/login", post(login_handler))
        .with_state(state)
}

/// Unwraps a JSON body, mapping extractor failures to API errors.
///
/// Missing fields are validation errors; any other body problem is malformed JSON.
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Logs the outcome of an operation and wraps it for axum.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &str,
    start_time: Instant,
    result: EngineResult<T>,
) -> ApiResult<T> {
    let duration_us = start_time.elapsed().as_micros();
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us,
                "Request completed"
            );
            Ok(Json(body))
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Request failed"
            );
            Err(err.into())
        }
    }
}

fn begin(operation: &str) -> (Uuid, Instant) {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, operation, "Processing request");
    (correlation_id, Instant::now())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        financial_years: state
            .config()
            .financial_years()
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

async fn period_amounts_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodAmountsRequest>, JsonRejection>,
) -> ApiResult<PeriodAmounts> {
    let (correlation_id, start_time) = begin("period_amounts");
    let request = parse_body(correlation_id, payload)?;

    let config = state.config();
    let tax_year = match request.financial_year {
        Some(year) => config.tax_year_for(year),
        None => config.latest_tax_year().1,
    };
    let result =
        calculate_period_amounts(&request.period, tax_year, &config.leave().standard_hours);
    respond(correlation_id, "period_amounts", start_time, result)
}

async fn payslip_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayslipApiRequest>, JsonRejection>,
) -> ApiResult<Payslip> {
    let (correlation_id, start_time) = begin("payslip");
    let request = parse_body(correlation_id, payload)?;

    let result = generate_payslip(&request.user, &request.pay_run, state.config());
    respond(correlation_id, "payslip", start_time, result)
}

async fn payroll_tax_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollTaxRequest>, JsonRejection>,
) -> ApiResult<PayrollTaxResult> {
    let (correlation_id, start_time) = begin("payroll_tax");
    let request = parse_body(correlation_id, payload)?;

    let result = request
        .validate()
        .map_err(EngineError::from)
        .and_then(|()| calculate_payroll_tax(request.wages, &request.state, state.config()));
    respond(correlation_id, "payroll_tax", start_time, result)
}

fn leave_accrual(
    request: &LeaveAccrualRequest,
    state: &AppState,
) -> EngineResult<LeaveAccrualResult> {
    let details = &request.employment_details;
    details.ensure_valid()?;
    calculate_leave_accrual(
        details.fte(),
        service_years(details.hired_date, request.as_of),
        request.leave_type,
        details.work_state,
        state.config().leave(),
        1,
    )
}

async fn leave_accrual_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveAccrualRequest>, JsonRejection>,
) -> ApiResult<LeaveAccrualResult> {
    let (correlation_id, start_time) = begin("leave_accrual");
    let request = parse_body(correlation_id, payload)?;

    let result = leave_accrual(&request, &state);
    respond(correlation_id, "leave_accrual", start_time, result)
}

async fn leave_summary_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveSummaryRequest>, JsonRejection>,
) -> ApiResult<LeaveSummary> {
    let (correlation_id, start_time) = begin("leave_summary");
    let request = parse_body(correlation_id, payload)?;

    let result = request.employment_details.ensure_valid().and_then(|()| {
        leave_summary(
            &request.leave_entitlements,
            &request.employment_details,
            request.as_of,
            state.config().leave(),
        )
    });
    respond(correlation_id, "leave_summary", start_time, result)
}

fn generate_id(ids: &IdService, request: GenerateIdRequest) -> EngineResult<GeneratedIdResponse> {
    let (kind, id) = match request {
        GenerateIdRequest::Company => (IdKind::Company, ids.generate_company_id()?.to_string()),
        GenerateIdRequest::Venue { company_id } => {
            let company = CompanyId::parse(&company_id)?;
            (IdKind::Venue, ids.generate_venue_id(&company)?.to_string())
        }
        GenerateIdRequest::WorkArea {
            company_id,
            venue_id,
        } => {
            let company = CompanyId::parse(&company_id)?;
            let venue = VenueId::parse(&venue_id)?;
            (
                IdKind::WorkArea,
                ids.generate_work_area_id(&company, &venue)?.to_string(),
            )
        }
        GenerateIdRequest::Linking {
            company_id,
            work_area_id,
        } => {
            let company = CompanyId::parse(&company_id)?;
            let work_area = WorkAreaId::parse(&work_area_id)?;
            (
                IdKind::Linking,
                ids.generate_linking_id(&company, &work_area)?.to_string(),
            )
        }
        GenerateIdRequest::Payroll { work_area } => {
            let kind: WorkAreaKind = work_area.parse()?;
            (IdKind::Payroll, ids.generate_payroll_id(kind)?.to_string())
        }
        GenerateIdRequest::Request { date } => {
            let day = date.unwrap_or_else(|| Utc::now().date_naive());
            (IdKind::Request, ids.generate_request_id(day))
        }
    };
    Ok(GeneratedIdResponse { kind, id })
}

async fn generate_id_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateIdRequest>, JsonRejection>,
) -> ApiResult<GeneratedIdResponse> {
    let (correlation_id, start_time) = begin("generate_id");
    let request = parse_body(correlation_id, payload)?;

    let result = generate_id(state.ids(), request);
    respond(correlation_id, "generate_id", start_time, result)
}

async fn validate_id_handler(
    payload: Result<Json<ValidateIdRequest>, JsonRejection>,
) -> ApiResult<IdValidationResponse> {
    let (correlation_id, start_time) = begin("validate_id");
    let request = parse_body(correlation_id, payload)?;

    let response = IdValidationResponse {
        kind: request.kind,
        valid: request.kind.matches(request.value.trim()),
        pattern: request.kind.pattern().to_string(),
        value: request.value,
    };
    respond(correlation_id, "validate_id", start_time, Ok(response))
}

async fn payroll_check_handler(
    payload: Result<Json<PayrollCheckRequest>, JsonRejection>,
) -> ApiResult<AssignmentReport> {
    let (correlation_id, start_time) = begin("payroll_check");
    let request = parse_body(correlation_id, payload)?;

    let report = check_payroll_id_assignment(&request.records);
    respond(correlation_id, "payroll_check", start_time, Ok(report))
}

async fn auto_correct_handler(
    payload: Result<Json<AutoCorrectRequest>, JsonRejection>,
) -> ApiResult<AutoCorrectResponse> {
    let (correlation_id, start_time) = begin("auto_correct");
    let mut request = parse_body(correlation_id, payload)?;

    let corrections = auto_correct(&mut request.record);
    let response = AutoCorrectResponse {
        record: request.record,
        corrections,
    };
    respond(correlation_id, "auto_correct", start_time, Ok(response))
}

async fn acn_handler(payload: Result<Json<AcnRequest>, JsonRejection>) -> ApiResult<AcnResponse> {
    let (correlation_id, start_time) = begin("acn_validate");
    let request = parse_body(correlation_id, payload)?;

    let response = match Acn::parse(&request.acn) {
        Ok(acn) => AcnResponse {
            acn: request.acn,
            valid: true,
            formatted: Some(acn.to_string()),
            message: None,
        },
        Err(err) => AcnResponse {
            acn: request.acn,
            valid: false,
            formatted: None,
            message: Some(err.to_string()),
        },
    };
    respond(correlation_id, "acn_validate", start_time, Ok(response))
}

async fn business_validate_handler(
    payload: Result<Json<BusinessValidateRequest>, JsonRejection>,
) -> ApiResult<BusinessValidationResponse> {
    let (correlation_id, start_time) = begin("business_validate");
    let request = parse_body(correlation_id, payload)?;

    let business = request.business;
    let result = business.ensure_valid().map(|()| BusinessValidationResponse {
        company_id: business.company_id.to_string(),
        profile: business.profile(),
        declared_type: business.entity_type,
    });
    respond(correlation_id, "business_validate", start_time, result)
}

async fn permission_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<PermissionCheckRequest>, JsonRejection>,
) -> ApiResult<PermissionCheckResponse> {
    let (correlation_id, start_time) = begin("permission_check");
    let request = parse_body(correlation_id, payload)?;

    let result = request
        .validate()
        .map_err(EngineError::from)
        .and_then(|()| {
            state
                .permissions()
                .check_permission(&request.user_id, &request.permission, &request.context)
        })
        .map(|allowed| PermissionCheckResponse {
            scope: request.context.scope(),
            user_id: request.user_id.clone(),
            permission: request.permission.clone(),
            allowed,
        });
    respond(correlation_id, "permission_check", start_time, result)
}

async fn effective_permissions_handler(
    State(state): State<AppState>,
    payload: Result<Json<EffectivePermissionsRequest>, JsonRejection>,
) -> ApiResult<EffectivePermissionsResponse> {
    let (correlation_id, start_time) = begin("effective_permissions");
    let request = parse_body(correlation_id, payload)?;

    let result = request
        .validate()
        .map_err(EngineError::from)
        .and_then(|()| {
            state
                .permissions()
                .effective_permissions(&request.user_id, &request.context)
        })
        .map(|permissions| EffectivePermissionsResponse {
            scope: request.context.scope(),
            user_id: request.user_id.clone(),
            permissions: permissions.into_iter().collect(),
        });
    respond(correlation_id, "effective_permissions", start_time, result)
}

async fn assign_role_handler(
    State(state): State<AppState>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> ApiResult<RoleAssignment> {
    let (correlation_id, start_time) = begin("assign_role");
    let request = parse_body(correlation_id, payload)?;

    let result = request.validate().map_err(EngineError::from).and_then(|()| {
        state.permissions().assign_role(
            &request.user_id,
            &request.role,
            &request.context,
            request.assigned_by.as_deref(),
        )
    });
    respond(correlation_id, "assign_role", start_time, result)
}

async fn remove_role_handler(
    State(state): State<AppState>,
    payload: Result<Json<RemoveRoleRequest>, JsonRejection>,
) -> ApiResult<RemoveRoleResponse> {
    let (correlation_id, start_time) = begin("remove_role");
    let request = parse_body(correlation_id, payload)?;

    let result = request
        .validate()
        .map_err(EngineError::from)
        .and_then(|()| {
            state
                .permissions()
                .remove_role(&request.user_id, &request.context)
        })
        .map(|removed| RemoveRoleResponse {
            user_id: request.user_id.clone(),
            removed,
        });
    respond(correlation_id, "remove_role", start_time, result)
}

async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthOutcome> {
    let (correlation_id, start_time) = begin("login");
    let request = parse_body(correlation_id, payload)?;

    let result = request.validate().map_err(EngineError::from).and_then(|()| {
        state
            .authenticator()
            .authenticate(&request.payroll_id, &request.password)
    });
    respond(correlation_id, "login", start_time, result)
}
