// HTTP handlers for the /api/properties routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::error::AuthError;
use crate::auth::middleware::{AdminUser, AuthenticatedUser, MaybeUser};
use crate::error::ApiError;
use crate::models::{ApiResponse, PageMeta};
use crate::properties::models::{
    AttachImagesRequest, CreatePropertyRequest, DetachImageRequest, PropertyResponse,
    UpdatePropertyRequest,
};
use crate::properties::repository::PropertyRepository;
use crate::query::{SearchParams, SearchQuery};
use crate::AppState;

/// Handler for GET /api/properties/search (public)
///
/// Authentication is optional; `source=datatable` needs it to scope
/// non-admin callers to their own listings.
#[utoipa::path(
    get,
    path = "/api/properties/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Paginated listings", body = [PropertyResponse]),
        (status = 400, description = "Invalid filter parameters")
    ),
    tag = "properties"
)]
pub async fn search_properties_handler(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AuthError> {
    let query = SearchQuery::validate(params).map_err(AuthError::Api)?;

    let owner_scope = if query.datatable {
        match &caller {
            Some(user) if !user.is_admin() => Some(user.id),
            Some(_) => None,
            None => return Err(AuthError::MissingToken),
        }
    } else {
        None
    };

    let builder = query.to_builder(owner_scope);
    let (rows, total) = PropertyRepository::new(state.db.clone())
        .search(&builder)
        .await
        .map_err(AuthError::Api)?;

    let message = if rows.is_empty() {
        "No properties found"
    } else {
        "Properties retrieved successfully"
    };
    let properties: Vec<PropertyResponse> = rows.into_iter().map(PropertyResponse::from).collect();
    Ok(ApiResponse::with_page(
        StatusCode::OK,
        message,
        properties,
        PageMeta::new(query.page, query.limit, total),
    ))
}

/// Handler for GET /api/properties/{property_id} (public)
#[utoipa::path(
    get,
    path = "/api/properties/{property_id}",
    params(("property_id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing with owner details", body = PropertyResponse),
        (status = 404, description = "Property not found")
    ),
    tag = "properties"
)]
pub async fn show_property_handler(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let property = PropertyRepository::new(state.db.clone())
        .find(property_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property".to_string()))?;
    Ok(ApiResponse::<PropertyResponse>::with_data(
        StatusCode::OK,
        "Property retrieved successfully",
        property.into(),
    ))
}

/// Handler for POST /api/properties (authenticated)
pub async fn create_property_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    PropertyRepository::new(state.db.clone())
        .create(
            caller.id,
            &request.name,
            &request.description,
            &request.address,
            &request.property_type,
            request.regular_price,
            request.discount_price,
            request.bedroom,
            request.bathroom,
            request.furnished,
            request.parking,
            request.offer,
            &request.images,
        )
        .await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::CREATED,
        "Property created successfully",
    ))
}

/// Handler for PATCH /api/properties/{property_id} (admin)
pub async fn update_property_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(property_id): Path<Uuid>,
    Json(request): Json<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let property = PropertyRepository::new(state.db.clone())
        .update(
            property_id,
            request.name.as_deref(),
            request.description.as_deref(),
            request.address.as_deref(),
            request.property_type.as_deref(),
            request.regular_price,
            request.discount_price,
            request.bedroom,
            request.bathroom,
            request.furnished,
            request.parking,
            request.offer,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Property".to_string()))?;

    Ok(ApiResponse::<PropertyResponse>::with_data(
        StatusCode::OK,
        "Property updated successfully",
        property.into(),
    ))
}

/// Handler for DELETE /api/properties/{property_id} (owner or admin)
pub async fn delete_property_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PropertyRepository::new(state.db.clone());
    let owner_id = repo
        .owner_of(property_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property".to_string()))?;
    caller.ensure_owner(owner_id)?;

    repo.delete(property_id).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Property deleted successfully",
    ))
}

/// Handler for POST /api/properties/{property_id}/images (owner or admin)
pub async fn attach_images_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(property_id): Path<Uuid>,
    Json(request): Json<AttachImagesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let repo = PropertyRepository::new(state.db.clone());
    let owner_id = repo
        .owner_of(property_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property".to_string()))?;
    caller.ensure_owner(owner_id)?;

    repo.attach_images(property_id, &request.images).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::CREATED,
        "Property images uploaded successfully",
    ))
}

/// Handler for DELETE /api/properties/{property_id}/images (owner or admin)
pub async fn detach_image_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(property_id): Path<Uuid>,
    Json(request): Json<DetachImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let repo = PropertyRepository::new(state.db.clone());
    let owner_id = repo
        .owner_of(property_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property".to_string()))?;
    caller.ensure_owner(owner_id)?;

    if !repo.detach_image(property_id, &request.image).await? {
        return Err(ApiError::NotFound("Image".to_string()));
    }
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Property image deleted successfully",
    ))
}
