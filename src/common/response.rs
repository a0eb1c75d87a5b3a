use crate::exception::{ErrorDetail, FieldViolation};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON body returned for every handled error.
///
/// ```json
/// {"title": "Unprocessable entity", "message": "User input error",
///  "errors": [{"field": "address.city", "message": "required"}]}
/// ```
///
/// `errors` and `exception` are left out of the body entirely when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub title: String,
    pub message: String,

    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,

    #[serde(rename = "exception", skip_serializing_if = "Option::is_none")]
    pub debug: Option<ErrorDetail>,
}

/// A field violation as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&FieldViolation> for FieldError {
    fn from(violation: &FieldViolation) -> Self {
        Self {
            field: violation.field(),
            message: violation.message.clone(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
