// Property models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_property_type;

/// Listing row joined with the owner's public fields
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub property_type: String,
    pub regular_price: i64,
    pub discount_price: Option<i64>,
    pub bedroom: i32,
    pub bathroom: i32,
    pub furnished: bool,
    pub parking: bool,
    pub offer: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_username: String,
    pub owner_email: String,
}

/// Owner block embedded in listing responses
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyOwner {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Listing as returned to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub regular_price: i64,
    pub discount_price: Option<i64>,
    pub bedroom: i32,
    pub bathroom: i32,
    pub furnished: bool,
    pub parking: bool,
    pub offer: bool,
    pub images: Vec<String>,
    pub owner: PropertyOwner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for PropertyResponse {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            property_type: row.property_type,
            regular_price: row.regular_price,
            discount_price: row.discount_price,
            bedroom: row.bedroom,
            bathroom: row.bathroom,
            furnished: row.furnished,
            parking: row.parking,
            offer: row.offer,
            images: row.images,
            owner: PropertyOwner {
                id: row.owner_id,
                username: row.owner_username,
                email: row.owner_email,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request body for POST /api/properties
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be 3 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(rename = "type")]
    #[validate(custom = "validate_property_type")]
    pub property_type: String,
    #[validate(range(min = 1, message = "Price must be a positive number"))]
    pub regular_price: i64,
    #[validate(range(min = 1, message = "Price must be a positive number"))]
    pub discount_price: Option<i64>,
    #[validate(range(min = 1, message = "Value must be a positive number"))]
    pub bedroom: i32,
    #[validate(range(min = 1, message = "Value must be a positive number"))]
    pub bathroom: i32,
    pub furnished: bool,
    pub parking: bool,
    pub offer: bool,
    /// Image URLs, at most 5
    #[validate(length(max = 5, message = "A property can hold at most 5 images"))]
    pub images: Vec<String>,
}

/// Request body for PATCH /api/properties/{id}; all fields optional
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be 3 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: Option<String>,
    #[serde(rename = "type")]
    #[validate(custom = "validate_property_type")]
    pub property_type: Option<String>,
    #[validate(range(min = 1, message = "Price must be a positive number"))]
    pub regular_price: Option<i64>,
    #[validate(range(min = 1, message = "Price must be a positive number"))]
    pub discount_price: Option<i64>,
    #[validate(range(min = 1, message = "Value must be a positive number"))]
    pub bedroom: Option<i32>,
    #[validate(range(min = 1, message = "Value must be a positive number"))]
    pub bathroom: Option<i32>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub offer: Option<bool>,
}

/// Request body for the image attach/detach endpoints
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AttachImagesRequest {
    #[validate(length(min = 1, max = 5, message = "Provide 1 to 5 image URLs"))]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DetachImageRequest {
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreatePropertyRequest {
        serde_json::from_str(
            r#"{
                "name": "Seaside villa",
                "description": "Three floors with a view",
                "address": "1 Shore Road",
                "type": "sale",
                "regularPrice": 250000,
                "discountPrice": 230000,
                "bedroom": 4,
                "bathroom": 2,
                "furnished": true,
                "parking": true,
                "offer": true,
                "images": ["https://cdn.example.com/a.jpg"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_create_request_validates() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_type_and_price() {
        let mut req = valid_create();
        req.property_type = "lease".to_string();
        assert!(req.validate().is_err());

        let mut req = valid_create();
        req.regular_price = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_caps_images_at_five() {
        let mut req = valid_create();
        req.images = (0..6).map(|i| format!("https://cdn.example.com/{}.jpg", i)).collect();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_uses_wire_field_names() {
        let row = PropertyRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Loft".to_string(),
            description: "Open plan".to_string(),
            address: "2 Mill Lane".to_string(),
            property_type: "rent".to_string(),
            regular_price: 1200,
            discount_price: None,
            bedroom: 1,
            bathroom: 1,
            furnished: false,
            parking: false,
            offer: false,
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_username: "bob".to_string(),
            owner_email: "bob@example.com".to_string(),
        };
        let json = serde_json::to_string(&PropertyResponse::from(row)).unwrap();
        assert!(json.contains("\"type\":\"rent\""));
        assert!(json.contains("\"regularPrice\":1200"));
        assert!(json.contains("\"owner\":{"));
    }
}
