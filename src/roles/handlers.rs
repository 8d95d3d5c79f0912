// HTTP handlers for the admin /api/roles routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AdminUser;
use crate::error::ApiError;
use crate::models::{ApiResponse, PageMeta};
use crate::query::{ListParams, ListQuery};
use crate::roles::models::{Role, RoleRequest};
use crate::roles::repository::RoleRepository;
use crate::AppState;

/// Handler for GET /api/roles
pub async fn list_roles_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = RoleRepository::new(state.db.clone()).list_all().await?;
    let message = if roles.is_empty() {
        "No roles found"
    } else {
        "Roles retrieved successfully"
    };
    Ok(ApiResponse::with_data(StatusCode::OK, message, roles))
}

/// Handler for GET /api/roles/search
pub async fn search_roles_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListQuery::validate(params)?;
    let (roles, total) = RoleRepository::new(state.db.clone()).search(&query).await?;

    let message = if roles.is_empty() {
        "No roles found"
    } else {
        "Roles retrieved successfully"
    };
    Ok(ApiResponse::with_page(
        StatusCode::OK,
        message,
        roles,
        PageMeta::new(query.page, query.limit, total),
    ))
}

/// Handler for POST /api/roles
pub async fn create_role_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    RoleRepository::new(state.db.clone())
        .create(&request.name)
        .await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::CREATED,
        "Role created successfully",
    ))
}

/// Handler for GET /api/roles/{role_id}
pub async fn show_role_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let role = RoleRepository::new(state.db.clone())
        .find(role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role".to_string()))?;
    Ok(ApiResponse::<Role>::with_data(
        StatusCode::OK,
        "Role retrieved successfully",
        role,
    ))
}

/// Handler for PUT /api/roles/{role_id}
pub async fn update_role_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(role_id): Path<Uuid>,
    Json(request): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let role = RoleRepository::new(state.db.clone())
        .update(role_id, &request.name)
        .await?;
    Ok(ApiResponse::<Role>::with_data(
        StatusCode::OK,
        "Role updated successfully",
        role,
    ))
}

/// Handler for DELETE /api/roles/{role_id}
pub async fn delete_role_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    RoleRepository::new(state.db.clone()).delete(role_id).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Role deleted successfully",
    ))
}
