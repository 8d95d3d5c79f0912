// Authentication error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use crate::error::ApiError;

/// Errors produced by the authentication flows
///
/// Every 401 variant carries the exact message the client contract expects;
/// anything outside the auth domain is delegated to [`ApiError`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token on a protected route
    #[error("Token is not provided")]
    MissingToken,

    /// Bearer token expired
    #[error("Token has expired")]
    ExpiredToken,

    /// Bearer token malformed or badly signed
    #[error("Token is invalid")]
    InvalidToken,

    /// No refreshToken cookie on signout/refresh
    #[error("Refresh token is not provided")]
    MissingRefreshToken,

    /// Refresh token unknown, revoked, or badly signed
    #[error("Refresh token is invalid")]
    InvalidRefreshToken,

    /// Refresh token past its expiry
    #[error("Refresh token has expired")]
    ExpiredRefreshToken,

    /// Sign-in failed; deliberately does not say which part was wrong
    #[error("Email or password is invalid")]
    InvalidCredentials,

    /// Email verification link unusable
    #[error("Verification token is invalid or has expired")]
    InvalidVerificationToken,

    /// Password reset link unusable
    #[error("Reset token is invalid or has expired")]
    InvalidResetToken,

    /// Signing a JWT failed
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    /// Validation, conflict, database and other shared errors
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::ExpiredToken
            | AuthError::InvalidToken
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::ExpiredRefreshToken
            | AuthError::InvalidCredentials
            | AuthError::InvalidVerificationToken
            | AuthError::InvalidResetToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Api(err) => err.status_code(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Api(err) => err.into_response(),
            AuthError::TokenGeneration(msg) => {
                tracing::error!("token generation failed: {}", msg);
                ApiError::Internal(msg).into_response()
            }
            other => {
                let status = other.status_code();
                warn!("authentication failed: {}", other);
                (
                    status,
                    Json(json!({
                        "code": status.as_u16(),
                        "message": other.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Api(ApiError::from(err))
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::Api(ApiError::from(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_are_unauthorized() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidVerificationToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_messages_match_client_contract() {
        assert_eq!(AuthError::MissingToken.to_string(), "Token is not provided");
        assert_eq!(AuthError::ExpiredToken.to_string(), "Token has expired");
        assert_eq!(AuthError::InvalidToken.to_string(), "Token is invalid");
        assert_eq!(
            AuthError::MissingRefreshToken.to_string(),
            "Refresh token is not provided"
        );
        assert_eq!(
            AuthError::InvalidRefreshToken.to_string(),
            "Refresh token is invalid"
        );
        assert_eq!(
            AuthError::ExpiredRefreshToken.to_string(),
            "Refresh token has expired"
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Email or password is invalid"
        );
    }

    #[test]
    fn test_delegated_api_errors_keep_their_status() {
        let err = AuthError::from(ApiError::conflict("email", "Email already in use"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
