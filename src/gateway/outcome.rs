//! Caller-visible bodies for refused requests.
//!
//! Shaped as FHIR `OperationOutcome` resources. The body only ever says
//! "Unauthorized" or "Internal server error"; which check failed is never
//! included.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::auth::{AuthFailure, Decision};

/// Build an `OperationOutcome` with a single issue.
pub fn operation_outcome(severity: &str, code: &str, details: &str) -> Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": severity,
            "code": code,
            "details": { "text": details },
        }],
    })
}

/// 401 with the uniform denial body.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(operation_outcome("information", "login", "Unauthorized")),
    )
        .into_response()
}

/// 500 with a body free of internal detail.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(operation_outcome("error", "exception", "Internal server error")),
    )
        .into_response()
}

/// Map a refused request to its response. Every denial gets the same 401.
pub fn failure_response(failure: &AuthFailure) -> Response {
    match failure.decision() {
        Decision::ServerError => internal_error(),
        Decision::Denied => unauthorized(),
        Decision::Allowed => {
            // A failure never maps to Allowed; refuse rather than let it through.
            debug_assert!(false, "auth failure {failure:?} decided as allowed");
            unauthorized()
        }
    }
}
