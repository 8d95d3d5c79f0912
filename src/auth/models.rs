// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_username;

/// Account row joined with its role name, as the auth flows need it
#[derive(Debug, Clone, FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub role_name: String,
    pub is_verified: bool,
}

/// Stored refresh token row
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Request body for POST /api/auth/signup
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, message = "Username is required"),
        custom = "validate_username"
    )]
    pub username: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Request body for POST /api/auth/signin
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body carrying only an email address
/// Used by resend-verification and forgot-password
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
}

/// Request body for POST /api/auth/reset-password/{token}
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Signed-in session returned by POST /api/auth/signin
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: String,
    /// Short-lived access token
    pub token: String,
}

/// Fresh access token returned by POST /api/auth/refresh-token
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            username: "alice42".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            ..clone_of(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            password: "abc".to_string(),
            ..clone_of(&valid)
        };
        assert!(short_password.validate().is_err());

        let bad_username = SignupRequest {
            username: "has spaces".to_string(),
            ..clone_of(&valid)
        };
        assert!(bad_username.validate().is_err());
    }

    #[test]
    fn test_reset_password_accepts_camel_case() {
        let req: ResetPasswordRequest =
            serde_json::from_str(r#"{"newPassword":"secret123"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.new_password, "secret123");
    }

    fn clone_of(req: &SignupRequest) -> SignupRequest {
        SignupRequest {
            username: req.username.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
        }
    }
}
