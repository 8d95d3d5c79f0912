// Shared wire-format models
// Every success response is wrapped in the same envelope

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope: `{ code, message, data?, meta? }`
///
/// `meta` is present only on paginated list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Pagination block for list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_size: u32,
    pub total_items: i64,
    pub current_page: u32,
    pub total_pages: i64,
}

impl PageMeta {
    /// Compute the pagination block for a page of results
    pub fn new(page: u32, limit: u32, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + limit as i64 - 1) / limit as i64
        };
        Self {
            page_size: limit,
            total_items,
            current_page: page,
            total_pages,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Plain success with a message and no payload
    pub fn message(status: StatusCode, message: &str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                message: message.to_string(),
                data: None,
                meta: None,
            }),
        )
    }

    /// Success carrying a payload
    pub fn with_data(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                message: message.to_string(),
                data: Some(data),
                meta: None,
            }),
        )
    }

    /// Paginated list success
    pub fn with_page(
        status: StatusCode,
        message: &str,
        data: T,
        meta: PageMeta,
    ) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                message: message.to_string(),
                data: Some(data),
                meta: Some(meta),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_exact_division() {
        let meta = PageMeta::new(1, 10, 20);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(meta.page_size, 10);
    }

    #[test]
    fn test_page_meta_rounds_up() {
        // 15 items at 10 per page need 2 pages
        let meta = PageMeta::new(2, 10, 15);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(meta.current_page, 2);
    }

    #[test]
    fn test_page_meta_empty_result() {
        let meta = PageMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.total_items, 0);
    }

    #[test]
    fn test_envelope_serialization_skips_absent_fields() {
        let (_, body) = ApiResponse::<()>::message(StatusCode::OK, "Signed out");
        let json = serde_json::to_string(&body.0).unwrap();
        assert!(json.contains("\"code\":200"));
        assert!(!json.contains("data"));
        assert!(!json.contains("meta"));
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let json = serde_json::to_string(&PageMeta::new(1, 10, 15)).unwrap();
        assert!(json.contains("pageSize"));
        assert!(json.contains("totalItems"));
        assert!(json.contains("currentPage"));
        assert!(json.contains("totalPages"));
    }
}
