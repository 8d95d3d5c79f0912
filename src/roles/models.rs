// Role models and DTOs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A role as stored and returned to admins
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// Request body for creating or renaming a role
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RoleRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}
