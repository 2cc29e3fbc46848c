//! Integration tests for the Repertoire engine API.
//!
//! Each test drives the router directly with `oneshot` and checks the JSON
//! it returns:
//! - Payroll: period amounts, payslips, payroll tax
//! - Leave: accrual and summaries
//! - Identifiers: generation, validation, payroll checks and correction
//! - ACN and business validation
//! - Permissions and sign-in
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use repertoire_engine::api::{AppState, create_router};
use repertoire_engine::config::ConfigLoader;
use repertoire_engine::models::BusinessUser;
use repertoire_engine::security::hash_password;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/au").expect("Failed to load config");
    AppState::new(config)
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn send(router: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("Content-Type", "application/json");
    }
    let response = router
        .oneshot(builder.body(body.map(Body::from).unwrap_or_else(Body::empty)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, "POST", uri, Some(body.to_string())).await
}

fn employee(payroll_id: &str, employment_details: Value) -> Value {
    json!({
        "payroll_id": payroll_id,
        "company_id": "CNY-2976",
        "company_name": "Le Repertoire Pty Ltd",
        "venue_id": "VEN-2976-30",
        "venue_name": "Le Repertoire",
        "work_area_id": "WAI-2976-3088",
        "work_area_name": "kitchen",
        "role_name": "Head Chef",
        "first_name": "Samantha",
        "preferred_name": "Sam",
        "last_name": "Rivera",
        "work_email": format!("{}@lerepertoire.com.au", payroll_id),
        "employment_details": employment_details
    })
}

fn business(entity_type: Option<&str>) -> Value {
    let mut body = json!({
        "company_id": "CNY-2976",
        "company_name": "Le Repertoire Pty Ltd",
        "director_name": "Alex Morgan",
        "acn": "010 499 966",
        "admin_user_id": "CNY-2976-2492",
        "head_office": {
            "address": "12 Collins Street",
            "suburb": "Melbourne",
            "state": "VIC",
            "post_code": "3000",
            "contact": { "phone": "(03) 9876 5432", "email": "office@lerepertoire.com.au" }
        },
        "venues": [{
            "venue_id": "VEN-2976-30",
            "venue_name": "Le Repertoire",
            "venue_manager_id": "EMP-2976-3087-308720",
            "venue_manager_name": "Jordan Lee",
            "work_areas": [
                { "work_area_name": "venue", "work_area_id": "WAI-2976-3087" },
                { "work_area_name": "kitchen", "work_area_id": "WAI-2976-3088" }
            ]
        }]
    });
    if let Some(kind) = entity_type {
        body["entity_type"] = json!(kind);
    }
    body
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_lists_financial_years() {
    let (status, result) = send(create_router_for_test(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["status"], "ok");
    let years: Vec<&str> = result["financial_years"]
        .as_array()
        .unwrap()
        .iter()
        .map(|y| y.as_str().unwrap())
        .collect();
    assert_eq!(years, vec!["2023-24", "2024-25"]);
}

// =============================================================================
// Payroll
// =============================================================================

#[tokio::test]
async fn test_period_amounts_fortnightly_60k() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/period-amounts",
        json!({ "annual_salary": "60000", "pay_frequency": "fortnightly" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["financial_year"], "2024-25");
    assert_eq!(decimal(&result["gross"]), Decimal::from_str("2307.69").unwrap());
    assert_eq!(decimal(&result["tax"]), Decimal::from_str("380.31").unwrap());
    assert_eq!(decimal(&result["medicare"]), Decimal::from_str("46.15").unwrap());
    assert_eq!(decimal(&result["net"]), Decimal::from_str("1927.38").unwrap());
    assert_eq!(decimal(&result["super"]), Decimal::from_str("265.38").unwrap());

    let steps = result["audit_trace"]["steps"].as_array().unwrap();
    assert!(steps.iter().any(|s| s["rule_id"] == "income_tax"));
}

#[tokio::test]
async fn test_period_amounts_earlier_year() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/period-amounts",
        json!({ "annual_salary": "60000", "financial_year": "2023-24" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["financial_year"], "2023-24");
    // 60000 * 11% / 26
    assert_eq!(decimal(&result["super"]), Decimal::from_str("253.85").unwrap());
}

#[tokio::test]
async fn test_period_amounts_missing_salary() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/period-amounts",
        json!({ "pay_frequency": "weekly" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_payslip() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payslip",
        json!({
            "user": employee("DK-100001", json!({
                "hired_date": "2020-01-06",
                "employment_type": "full time",
                "pay_rate": { "per_annum_rate": "60000" }
            })),
            "pay_date": "2024-07-14",
            "pay_period_start": "2024-07-01",
            "pay_period_end": "2024-07-14"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["employee"]["payroll_id"], "DK-100001");
    assert_eq!(result["company"]["venue"], "Le Repertoire");
    assert_eq!(result["payment"]["financial_year"], "2024-25");
    assert_eq!(decimal(&result["earnings"]["net"]), Decimal::from_str("1927.38").unwrap());
    assert_eq!(result["leave"]["balances"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_payslip_period_reversed() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payslip",
        json!({
            "user": employee("DK-100001", json!({
                "hired_date": "2020-01-06",
                "employment_type": "full time"
            })),
            "pay_date": "2024-07-14",
            "pay_period_start": "2024-07-14",
            "pay_period_end": "2024-07-01"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_payslip_rejects_oversized_pay_rate() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payslip",
        json!({
            "user": employee("DK-100001", json!({
                "hired_date": "2020-01-06",
                "employment_type": "full time",
                "pay_rate": { "hourly_rate": "79228162514264337593543950335" }
            })),
            "pay_date": "2024-07-14",
            "pay_period_start": "2024-07-01",
            "pay_period_end": "2024-07-14"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", result);
    assert_eq!(result["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_payroll_tax_above_threshold() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payroll-tax",
        json!({ "wages": "2200000", "state": "NSW" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["state"], "NSW");
    assert_eq!(decimal(&result["tax"]), Decimal::from(47_500));
}

#[tokio::test]
async fn test_payroll_tax_unknown_and_unconfigured_states() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payroll-tax",
        json!({ "wages": "2200000", "state": "XYZ" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "INVALID_STATE_CODE");

    let (status, result) = post_json(
        create_router_for_test(),
        "/payroll/payroll-tax",
        json!({ "wages": "2200000", "state": "TAS" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "STATE_NOT_CONFIGURED");
}

// =============================================================================
// Leave
// =============================================================================

#[tokio::test]
async fn test_leave_accrual_part_time() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/leave/accrual",
        json!({
            "employment_details": {
                "hired_date": "2020-01-01",
                "employment_type": "part time",
                "hours_per_week": "19"
            },
            "leave_type": "annual",
            "as_of": "2024-07-01"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(decimal(&result["hours"]), Decimal::from(76));
    assert_eq!(result["eligible"], true);
}

#[tokio::test]
async fn test_leave_accrual_invalid_hours() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/leave/accrual",
        json!({
            "employment_details": {
                "hired_date": "2020-01-01",
                "employment_type": "part time",
                "hours_per_week": "200"
            },
            "leave_type": "annual",
            "as_of": "2024-07-01"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_leave_summary_long_service_pending() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/leave/summary",
        json!({
            "employment_details": { "hired_date": "2020-01-01", "employment_type": "full time" },
            "leave_entitlements": { "annual": { "accrued": "100", "taken": "38" } },
            "as_of": "2024-01-01"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(decimal(&result["balances"][0]["balance"]), Decimal::from(62));
    assert_eq!(result["long_service"]["eligible"], false);
    assert_eq!(result["long_service"]["state"], "VIC");
}

// =============================================================================
// Identifiers
// =============================================================================

#[tokio::test]
async fn test_generate_ids_in_sequence() {
    let state = create_test_state();

    let (status, result) = post_json(
        create_router(state.clone()),
        "/ids/generate",
        json!({ "kind": "payroll", "work_area": "kitchen" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["id"], "DK-100001");

    let (_, result) = post_json(
        create_router(state.clone()),
        "/ids/generate",
        json!({ "kind": "payroll", "work_area": "bar" }),
    )
    .await;
    assert_eq!(result["id"], "DB-100002");

    let (_, result) = post_json(
        create_router(state),
        "/ids/generate",
        json!({ "kind": "request", "date": "2024-07-01" }),
    )
    .await;
    assert_eq!(result["id"], "REQ-20240701-00001");
}

#[tokio::test]
async fn test_generate_venue_and_company() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/generate",
        json!({ "kind": "venue", "company_id": "CNY-2976" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(result["id"].as_str().unwrap().starts_with("VEN-2976-"));

    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/generate",
        json!({ "kind": "company" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["kind"], "company");
    assert!(result["id"].as_str().unwrap().starts_with("CNY-"));
}

#[tokio::test]
async fn test_generate_with_bad_parent() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/generate",
        json!({ "kind": "venue", "company_id": "CNY-12" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "INVALID_ID");

    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/generate",
        json!({ "kind": "payroll", "work_area": "spa" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "UNKNOWN_WORK_AREA");
}

#[tokio::test]
async fn test_validate_id() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/validate",
        json!({ "kind": "work_area", "value": "WAI-2976-3087" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["valid"], true);

    let (_, result) = post_json(
        create_router_for_test(),
        "/ids/validate",
        json!({ "kind": "payroll", "value": "DK-1001" }),
    )
    .await;
    assert_eq!(result["valid"], false);
}

#[tokio::test]
async fn test_payroll_check_report() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/payroll-check",
        json!({ "records": [
            { "employee": "Sam", "payroll_id": "DK-100001", "work_area_name": "kitchen" },
            { "employee": "Alex", "payroll_id": "DB-100002", "work_area_name": "kitchen" },
            { "employee": "Jo" }
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["total"], 3);
    assert_eq!(result["correct"], 1);
    assert_eq!(result["incorrect"], 2);
    assert_eq!(result["issues"][0]["employee"], "Alex");
}

#[tokio::test]
async fn test_auto_correct() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/ids/auto-correct",
        json!({ "record": {
            "employee": "Alex",
            "payroll_id": "DB-100002",
            "work_area_name": "kitchen",
            "work_email": "DB-100002@lerepertoire.com.au"
        }}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["record"]["payroll_id"], "DK-100002");
    assert_eq!(result["record"]["work_email"], "DK-100002@lerepertoire.com.au");
    assert_eq!(result["corrections"]["payroll_id_corrected"], true);
    assert_eq!(result["corrections"]["work_email_corrected"], true);
}

// =============================================================================
// ACN and business validation
// =============================================================================

#[tokio::test]
async fn test_acn_validation() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/acn/validate",
        json!({ "acn": "010499966" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["valid"], true);
    assert_eq!(result["formatted"], "010 499 966");

    let (_, result) = post_json(
        create_router_for_test(),
        "/acn/validate",
        json!({ "acn": "010 499 967" }),
    )
    .await;
    assert_eq!(result["valid"], false);
    assert!(result["message"].as_str().unwrap().contains("check digit"));
}

#[tokio::test]
async fn test_business_validation_classifies() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/business/validate",
        json!({ "business": business(None) }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["profile"]["entity_type"], "single-venue");
    assert_eq!(result["profile"]["work_area_count"], 2);
}

#[tokio::test]
async fn test_business_validation_rejects_wrong_type() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/business/validate",
        json!({ "business": business(Some("multi-venue")) }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "VALIDATION_ERROR");
    assert!(result["message"].as_str().unwrap().contains("entity_type"));
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test]
async fn test_permission_lifecycle() {
    let state = create_test_state();
    let context = json!({ "business_id": "CNY-2976" });

    let (status, result) = post_json(
        create_router(state.clone()),
        "/permissions/assign",
        json!({ "user_id": "u1", "role": "manager", "context": context, "assigned_by": "owner-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["scope"], "business");
    assert_eq!(result["inherited_roles"], json!(["employee", "staff"]));

    let (_, result) = post_json(
        create_router(state.clone()),
        "/permissions/check",
        json!({ "user_id": "u1", "permission": "view_reports", "context": context }),
    )
    .await;
    assert_eq!(result["allowed"], true);

    let (_, result) = post_json(
        create_router(state.clone()),
        "/permissions/effective",
        json!({ "user_id": "u1", "context": context }),
    )
    .await;
    let permissions = result["permissions"].as_array().unwrap();
    assert!(permissions.contains(&json!("view_own_schedule")));
    assert!(!permissions.contains(&json!("manage_settings")));

    let (_, result) = post_json(
        create_router(state.clone()),
        "/permissions/remove",
        json!({ "user_id": "u1", "context": context }),
    )
    .await;
    assert_eq!(result["removed"], true);

    let (_, result) = post_json(
        create_router(state),
        "/permissions/check",
        json!({ "user_id": "u1", "permission": "view_reports", "context": context }),
    )
    .await;
    assert_eq!(result["allowed"], false);
}

#[tokio::test]
async fn test_assign_role_outside_scope() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/permissions/assign",
        json!({
            "user_id": "u1",
            "role": "owner",
            "context": { "business_id": "CNY-2976", "venue_id": "VEN-2976-30" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "INVALID_ROLE");
}

#[tokio::test]
async fn test_empty_user_is_never_allowed() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/permissions/check",
        json!({ "user_id": "", "permission": "view_own_tasks" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["allowed"], false);
    assert_eq!(result["scope"], "system");
}

// =============================================================================
// Sign-in
// =============================================================================

fn state_with_user(password: &str) -> AppState {
    let state = create_test_state();
    let mut user: BusinessUser = serde_json::from_value(employee(
        "DK-100001",
        json!({ "hired_date": "2020-01-06", "employment_type": "full time" }),
    ))
    .unwrap();
    user.password_hash = Some(hash_password(password).unwrap());
    user.password_updated_at = Some(chrono::Utc::now());
    state.users().insert(user).unwrap();
    state
}

#[tokio::test]
async fn test_login_succeeds() {
    let state = state_with_user("Kitchen#Roster9");
    let (status, result) = post_json(
        create_router(state),
        "/auth/login",
        json!({ "payroll_id": "DK-100001", "password": "Kitchen#Roster9" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["display_name"], "Sam Rivera");
    assert_eq!(result["password_rotation_due"], false);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let state = state_with_user("Kitchen#Roster9");
    let attempt = json!({ "payroll_id": "DK-100001", "password": "Wrong#Password1" });

    for _ in 0..5 {
        let (status, result) = post_json(create_router(state.clone()), "/auth/login", attempt.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(result["code"], "AUTH_FAILED");
    }

    let (status, result) = post_json(
        create_router(state),
        "/auth/login",
        json!({ "payroll_id": "DK-100001", "password": "Kitchen#Roster9" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(result["code"], "RATE_LIMITED");
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_malformed_json() {
    let (status, result) = send(
        create_router_for_test(),
        "POST",
        "/payroll/payroll-tax",
        Some("{ not json".to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_wrong_field_type_is_malformed() {
    let (status, result) = post_json(
        create_router_for_test(),
        "/leave/accrual",
        json!({
            "employment_details": { "hired_date": "not a date", "employment_type": "full time" },
            "leave_type": "annual",
            "as_of": "2024-07-01"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["code"], "MALFORMED_JSON");
}
