// HTTP handlers for the /api/users routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::{AdminUser, AuthenticatedUser};
use crate::auth::password;
use crate::error::ApiError;
use crate::models::{ApiResponse, PageMeta};
use crate::query::{ListParams, ListQuery};
use crate::users::models::{
    CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserResponse,
};
use crate::users::repository::UserAdminRepository;
use crate::AppState;

/// Handler for GET /api/users/search (admin)
pub async fn search_users_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListQuery::validate(params)?;
    let (users, total) = UserAdminRepository::new(state.db.clone())
        .search(&query)
        .await?;

    let message = if users.is_empty() {
        "No users found"
    } else {
        "Users retrieved successfully"
    };
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::with_page(
        StatusCode::OK,
        message,
        users,
        PageMeta::new(query.page, query.limit, total),
    ))
}

/// Handler for POST /api/users (admin)
/// Accounts created here are verified immediately; no email is sent.
pub async fn create_user_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let repo = UserAdminRepository::new(state.db.clone());

    let conflicts = repo
        .find_conflicts(Some(&request.username), Some(&request.email), None)
        .await?;
    if !conflicts.is_empty() {
        return Err(ApiError::Conflict(conflicts));
    }
    if !repo.role_exists(request.role_id).await? {
        return Err(ApiError::field("roleId", "Role id is invalid"));
    }

    let password_hash = password::hash_password(&request.password)?;
    repo.create_verified(
        &request.username,
        &request.email,
        &password_hash,
        &state.config.default_avatar_url,
        request.role_id,
    )
    .await?;

    Ok(ApiResponse::<()>::message(
        StatusCode::CREATED,
        "User created successfully",
    ))
}

/// Handler for GET /api/users/{user_id} (self or admin)
pub async fn show_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    caller.ensure_owner(user_id)?;

    let user = UserAdminRepository::new(state.db.clone())
        .find(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))?;
    Ok(ApiResponse::<UserResponse>::with_data(
        StatusCode::OK,
        "User retrieved successfully",
        user.into(),
    ))
}

/// Handler for PATCH /api/users/{user_id} (admin)
/// The only update path allowed to change an account's role.
pub async fn update_user_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let repo = UserAdminRepository::new(state.db.clone());

    let conflicts = repo
        .find_conflicts(
            request.username.as_deref(),
            request.email.as_deref(),
            Some(user_id),
        )
        .await?;
    if !conflicts.is_empty() {
        return Err(ApiError::Conflict(conflicts));
    }
    if let Some(role_id) = request.role_id {
        if !repo.role_exists(role_id).await? {
            return Err(ApiError::field("roleId", "Role id is invalid"));
        }
    }

    let password_hash = match &request.password {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = repo
        .update(
            user_id,
            request.username.as_deref(),
            request.email.as_deref(),
            password_hash.as_deref(),
            None,
            request.role_id,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))?;

    Ok(ApiResponse::<UserResponse>::with_data(
        StatusCode::OK,
        "User updated successfully",
        user.into(),
    ))
}

/// Handler for PATCH /api/users/{user_id}/profile (self or admin)
pub async fn update_profile_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    caller.ensure_owner(user_id)?;
    request.validate()?;
    let repo = UserAdminRepository::new(state.db.clone());

    let conflicts = repo
        .find_conflicts(
            request.username.as_deref(),
            request.email.as_deref(),
            Some(user_id),
        )
        .await?;
    if !conflicts.is_empty() {
        return Err(ApiError::Conflict(conflicts));
    }

    let password_hash = match &request.password {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = repo
        .update(
            user_id,
            request.username.as_deref(),
            request.email.as_deref(),
            password_hash.as_deref(),
            request.avatar.as_deref(),
            None,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))?;

    Ok(ApiResponse::<UserResponse>::with_data(
        StatusCode::OK,
        "Profile updated successfully",
        user.into(),
    ))
}

/// Handler for DELETE /api/users/{user_id} (self or admin)
/// Owned properties and refresh tokens go with the account.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    caller.ensure_owner(user_id)?;
    UserAdminRepository::new(state.db.clone())
        .delete(user_id)
        .await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "User deleted successfully",
    ))
}
