// Error handling module for the Estate API
// Provides the shared error taxonomy and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, warn};

/// Field-level error map used by validation and conflict responses
pub type FieldErrors = BTreeMap<String, String>;

/// Main error type for the API
///
/// Handlers perform domain checks and return these typed errors; the
/// `IntoResponse` impl is the single point where they become wire responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request failed schema or domain validation
    /// Maps to HTTP 400 with a field -> message map
    #[error("Validation errors")]
    Validation(FieldErrors),

    /// A unique resource is already taken
    /// Maps to HTTP 409 with a field -> message map
    #[error("Resource already in use")]
    Conflict(FieldErrors),

    /// Resource lookup by id failed
    /// Maps to HTTP 404; the body carries `data: null`
    #[error("{0} not found")]
    NotFound(String),

    /// Role or ownership check failed
    /// Maps to HTTP 403
    #[error("Permission denied")]
    PermissionDenied,

    /// Database operation failed
    /// Maps to HTTP 500; details are never sent to the client
    #[error("Database error: {0}")]
    Database(String),

    /// Any other internal failure
    /// Maps to HTTP 500; details are never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Build a single-field validation error
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        ApiError::Validation(errors)
    }

    /// Build a single-field conflict error
    pub fn conflict(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        ApiError::Conflict(errors)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Validation(errors) => {
                warn!(?errors, "request validation failed");
                json!({
                    "code": status.as_u16(),
                    "message": "Validation errors",
                    "errors": errors,
                })
            }
            ApiError::Conflict(errors) => {
                warn!(?errors, "resource conflict");
                json!({
                    "code": status.as_u16(),
                    "message": "Resource already in use",
                    "errors": errors,
                })
            }
            ApiError::NotFound(resource) => {
                warn!(resource = %resource, "resource not found");
                json!({
                    "code": status.as_u16(),
                    "message": format!("{} not found", resource),
                    "data": null,
                })
            }
            ApiError::PermissionDenied => {
                warn!("permission denied");
                json!({
                    "code": status.as_u16(),
                    "message": "Permission denied",
                })
            }
            ApiError::Database(msg) => {
                error!("database error: {}", msg);
                json!({
                    "code": status.as_u16(),
                    "message": "Internal server error",
                })
            }
            ApiError::Internal(msg) => {
                error!("internal error: {}", msg);
                json!({
                    "code": status.as_u16(),
                    "message": "Internal server error",
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

/// Flatten validator's nested error structure into a field -> message map,
/// keeping the first message per field
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{} is invalid", field));
            fields.insert(field.to_string(), message);
        }
        ApiError::Validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::field("name", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::conflict("email", "taken").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("Property".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::PermissionDenied.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Database("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_keep_details_for_logs_only() {
        let err = ApiError::Database("connection refused at 10.0.0.5".to_string());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_field_helper_builds_single_entry_map() {
        match ApiError::conflict("username", "Username already in use") {
            ApiError::Conflict(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors.get("username").map(String::as_str),
                    Some("Username already in use")
                );
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }
}
