// Admin dashboard statistics

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AdminUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::properties::models::{PropertyResponse, PropertyRow};
use crate::AppState;

/// Aggregate counts plus the newest listings
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_properties: i64,
    pub total_roles: i64,
    pub recent_properties: Vec<PropertyResponse>,
}

/// Handler for GET /api/dashboard (admin)
///
/// Counts and the recent-listings sample come from one transaction so the
/// numbers describe a single snapshot.
pub async fn stats_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    let total_roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
        .fetch_one(&mut *tx)
        .await?;
    let total_properties: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
        .fetch_one(&mut *tx)
        .await?;

    let recent = sqlx::query_as::<_, PropertyRow>(
        "SELECT p.id, p.owner_id, p.name, p.description, p.address, p.property_type, \
         p.regular_price, p.discount_price, p.bedroom, p.bathroom, p.furnished, \
         p.parking, p.offer, p.images, p.created_at, p.updated_at, \
         u.username AS owner_username, u.email AS owner_email \
         FROM properties p JOIN users u ON u.id = p.owner_id \
         ORDER BY p.created_at DESC LIMIT 5",
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let stats = DashboardStats {
        total_users,
        total_properties,
        total_roles,
        recent_properties: recent.into_iter().map(PropertyResponse::from).collect(),
    };

    Ok(ApiResponse::<DashboardStats>::with_data(
        StatusCode::OK,
        "Statistics data retrieved successfully",
        stats,
    ))
}
