// User management models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::roles::models::Role;
use crate::validation::validate_username;

/// Account row joined with its role, as read from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role_id: Uuid,
    pub role_name: String,
}

/// Public account representation; never carries the password hash
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub is_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            avatar: row.avatar,
            is_verified: row.is_verified,
            role: Role {
                id: row.role_id,
                name: row.role_name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request body for POST /api/users (admin)
/// Accounts created this way start out verified.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, message = "Username is required"),
        custom = "validate_username"
    )]
    pub username: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role_id: Uuid,
}

/// Request body for PATCH /api/users/{id} (admin); all fields optional
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, message = "Username is required"),
        custom = "validate_username"
    )]
    pub username: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
}

/// Request body for PATCH /api/users/{id}/profile (self or admin)
/// Like the admin update but cannot change the role.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, message = "Username is required"),
        custom = "validate_username"
    )]
    pub username: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password() {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            avatar: "https://placehold.co/128x128".to_string(),
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            role_id: Uuid::new_v4(),
            role_name: "user".to_string(),
        };
        let json = serde_json::to_string(&UserResponse::from(row)).unwrap();
        assert!(json.contains("\"isVerified\":true"));
        assert!(json.contains("\"name\":\"user\""));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_update_request_accepts_partial_bodies() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.username.as_deref(), Some("bob"));
        assert!(req.email.is_none());
    }

    #[test]
    fn test_profile_avatar_must_be_url() {
        let req = UpdateProfileRequest {
            avatar: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
