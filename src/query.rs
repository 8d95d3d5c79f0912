// SQL assembly for the property search endpoint
// Builds a parameterized listing query and its twin COUNT query

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// A typed bind value produced by the builder
///
/// The repository matches on this to call the correctly typed `bind`,
/// so numeric and boolean filters are never sent as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
}

/// Sort orders accepted by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Latest,
    Oldest,
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortBy {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "latest" => Ok(SortBy::Latest),
            "oldest" => Ok(SortBy::Oldest),
            "price_low_to_high" => Ok(SortBy::PriceLowToHigh),
            "price_high_to_low" => Ok(SortBy::PriceHighToLow),
            _ => Err(ApiError::field(
                "sortBy",
                "sortBy must be one of: latest, oldest, price_low_to_high, price_high_to_low",
            )),
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            SortBy::Latest => "p.created_at DESC",
            SortBy::Oldest => "p.created_at ASC",
            SortBy::PriceLowToHigh => "p.regular_price ASC, p.discount_price ASC",
            SortBy::PriceHighToLow => "p.regular_price DESC, p.discount_price DESC",
        }
    }
}

const BASE_SELECT: &str = "SELECT p.id, p.owner_id, p.name, p.description, p.address, \
     p.property_type, p.regular_price, p.discount_price, p.bedroom, p.bathroom, \
     p.furnished, p.parking, p.offer, p.images, p.created_at, p.updated_at, \
     u.username AS owner_username, u.email AS owner_email \
     FROM properties p JOIN users u ON u.id = p.owner_id";

const BASE_COUNT: &str =
    "SELECT COUNT(*) FROM properties p JOIN users u ON u.id = p.owner_id";

/// Builder for the property search query
///
/// Filters are appended as AND-joined WHERE clauses with `$n` placeholders;
/// `build` and `build_count` share the same clause list so the page and the
/// total always agree.
pub struct PropertySearchBuilder {
    where_clauses: Vec<String>,
    params: Vec<SqlParam>,
    sort: SortBy,
    limit: u32,
    offset: u32,
}

impl PropertySearchBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            sort: SortBy::default(),
            limit: 10,
            offset: 0,
        }
    }

    fn push_param(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Free-text search across the listing columns and the owner's email,
    /// plus numeric equality when the term parses as a number
    pub fn add_text_search(&mut self, q: &str) {
        let pattern = format!("%{}%", q);
        let mut conditions = Vec::new();
        for column in [
            "p.name",
            "p.description",
            "p.address",
            "p.property_type",
            "u.email",
        ] {
            let idx = self.push_param(SqlParam::Text(pattern.clone()));
            conditions.push(format!("{} ILIKE ${}", column, idx));
        }

        if let Ok(n) = q.trim().parse::<i64>() {
            for column in ["p.regular_price", "p.discount_price"] {
                let idx = self.push_param(SqlParam::Int(n));
                conditions.push(format!("{} = ${}", column, idx));
            }
            for column in ["p.bedroom", "p.bathroom"] {
                let idx = self.push_param(SqlParam::Int(n));
                conditions.push(format!("{} = ${}", column, idx));
            }
        }

        self.where_clauses
            .push(format!("({})", conditions.join(" OR ")));
    }

    /// Exact match on the listing type ("sale" or "rent")
    pub fn add_type_filter(&mut self, property_type: &str) {
        let idx = self.push_param(SqlParam::Text(property_type.to_string()));
        self.where_clauses
            .push(format!("p.property_type = ${}", idx));
    }

    /// Boolean attribute filter (offer / furnished / parking)
    pub fn add_flag(&mut self, column: &'static str, value: bool) {
        let idx = self.push_param(SqlParam::Bool(value));
        self.where_clauses.push(format!("p.{} = ${}", column, idx));
    }

    /// Price bounds; a listing matches when either its regular or discount
    /// price falls inside the bound
    pub fn add_price_range(&mut self, min: Option<i64>, max: Option<i64>) {
        if let Some(min) = min {
            let a = self.push_param(SqlParam::Int(min));
            let b = self.push_param(SqlParam::Int(min));
            self.where_clauses.push(format!(
                "(p.regular_price >= ${} OR p.discount_price >= ${})",
                a, b
            ));
        }
        if let Some(max) = max {
            let a = self.push_param(SqlParam::Int(max));
            let b = self.push_param(SqlParam::Int(max));
            self.where_clauses.push(format!(
                "(p.regular_price <= ${} OR p.discount_price <= ${})",
                a, b
            ));
        }
    }

    /// Inclusive integer range on a room-count column
    pub fn add_count_range(&mut self, column: &'static str, min: Option<i64>, max: Option<i64>) {
        if let Some(min) = min {
            let idx = self.push_param(SqlParam::Int(min));
            self.where_clauses.push(format!("p.{} >= ${}", column, idx));
        }
        if let Some(max) = max {
            let idx = self.push_param(SqlParam::Int(max));
            self.where_clauses.push(format!("p.{} <= ${}", column, idx));
        }
    }

    /// Restrict results to listings owned by one user
    pub fn set_owner_scope(&mut self, owner_id: Uuid) {
        let idx = self.push_param(SqlParam::Uuid(owner_id));
        self.where_clauses.push(format!("p.owner_id = ${}", idx));
    }

    pub fn set_sort(&mut self, sort: SortBy) {
        self.sort = sort;
    }

    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Final page query with ORDER BY / LIMIT / OFFSET
    pub fn build(&self) -> (String, Vec<SqlParam>) {
        let query = format!(
            "{}{} ORDER BY {} LIMIT {} OFFSET {}",
            BASE_SELECT,
            self.where_sql(),
            self.sort.order_clause(),
            self.limit,
            self.offset
        );
        (query, self.params.clone())
    }

    /// COUNT query over the same filter set
    pub fn build_count(&self) -> (String, Vec<SqlParam>) {
        (
            format!("{}{}", BASE_COUNT, self.where_sql()),
            self.params.clone(),
        )
    }
}

/// Plain q/page/limit parameters for the roles and users search endpoints
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated q/page/limit triple
#[derive(Debug)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListQuery {
    pub fn validate(params: ListParams) -> Result<Self, ApiError> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::field("page", "page must be a positive number"));
        }
        let limit = params.limit.unwrap_or(10);
        if limit == 0 || limit > 100 {
            return Err(ApiError::field("limit", "limit must be between 1 and 100"));
        }
        Ok(Self {
            q: normalize(params.q),
            page,
            limit,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Raw query parameters as they arrive on the wire
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Free-text search term
    pub q: Option<String>,
    /// Listing type filter: "sale" or "rent"
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedroom: Option<i64>,
    pub max_bedroom: Option<i64>,
    pub min_bathroom: Option<i64>,
    pub max_bathroom: Option<i64>,
    pub offer: Option<bool>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    /// latest | oldest | price_low_to_high | price_high_to_low
    pub sort_by: Option<String>,
    /// 1-indexed page number, defaults to 1
    pub page: Option<u32>,
    /// Items per page, 1..=100, defaults to 10
    pub limit: Option<u32>,
    /// "datatable" scopes results to the caller's own listings
    pub source: Option<String>,
}

/// Validated and normalized search parameters
#[derive(Debug)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedroom: Option<i64>,
    pub max_bedroom: Option<i64>,
    pub min_bathroom: Option<i64>,
    pub max_bathroom: Option<i64>,
    pub offer: Option<bool>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub sort_by: SortBy,
    pub page: u32,
    pub limit: u32,
    pub datatable: bool,
}

impl SearchQuery {
    /// Validate raw parameters, applying defaults
    pub fn validate(params: SearchParams) -> Result<Self, ApiError> {
        let q = normalize(params.q);
        let property_type = normalize(params.property_type);
        if let Some(ref t) = property_type {
            crate::validation::validate_property_type(t)
                .map_err(|_| ApiError::field("type", "Property type must be one of: sale, rent"))?;
        }

        check_range("minPrice", "maxPrice", params.min_price, params.max_price)?;
        check_range(
            "minBedroom",
            "maxBedroom",
            params.min_bedroom,
            params.max_bedroom,
        )?;
        check_range(
            "minBathroom",
            "maxBathroom",
            params.min_bathroom,
            params.max_bathroom,
        )?;

        let sort_by = match params.sort_by.as_deref() {
            Some(s) => SortBy::parse(s)?,
            None => SortBy::default(),
        };

        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::field("page", "page must be a positive number"));
        }
        let limit = params.limit.unwrap_or(10);
        if limit == 0 || limit > 100 {
            return Err(ApiError::field("limit", "limit must be between 1 and 100"));
        }

        Ok(Self {
            q,
            property_type,
            min_price: params.min_price,
            max_price: params.max_price,
            min_bedroom: params.min_bedroom,
            max_bedroom: params.max_bedroom,
            min_bathroom: params.min_bathroom,
            max_bathroom: params.max_bathroom,
            offer: params.offer,
            furnished: params.furnished,
            parking: params.parking,
            sort_by,
            page,
            limit,
            datatable: params.source.as_deref() == Some("datatable"),
        })
    }

    /// Assemble the search builder from the validated parameters
    ///
    /// `owner_scope` is set for datatable requests from non-admin callers.
    pub fn to_builder(&self, owner_scope: Option<Uuid>) -> PropertySearchBuilder {
        let mut builder = PropertySearchBuilder::new();

        if let Some(ref q) = self.q {
            builder.add_text_search(q);
        }
        if let Some(ref t) = self.property_type {
            builder.add_type_filter(t);
        }
        if let Some(offer) = self.offer {
            builder.add_flag("offer", offer);
        }
        if let Some(furnished) = self.furnished {
            builder.add_flag("furnished", furnished);
        }
        if let Some(parking) = self.parking {
            builder.add_flag("parking", parking);
        }
        builder.add_price_range(self.min_price, self.max_price);
        builder.add_count_range("bedroom", self.min_bedroom, self.max_bedroom);
        builder.add_count_range("bathroom", self.min_bathroom, self.max_bathroom);
        if let Some(owner_id) = owner_scope {
            builder.set_owner_scope(owner_id);
        }
        builder.set_sort(self.sort_by);
        builder.set_pagination(self.page, self.limit);

        builder
    }
}

fn normalize(s: Option<String>) -> Option<String> {
    s.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn check_range(
    min_name: &str,
    max_name: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(min) = min {
        if min < 0 {
            return Err(ApiError::field(min_name, "must not be negative"));
        }
    }
    if let Some(max) = max {
        if max < 0 {
            return Err(ApiError::field(max_name, "must not be negative"));
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ApiError::field(
                min_name,
                &format!("{} cannot be greater than {}", min_name, max_name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_builder_basic_query() {
        let builder = PropertySearchBuilder::new();
        let (query, params) = builder.build();
        assert!(query.starts_with(BASE_SELECT));
        assert!(!query.contains("WHERE"));
        assert!(query.contains("ORDER BY p.created_at DESC"));
        assert!(query.contains("LIMIT 10 OFFSET 0"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_builder_text_search_binds_pattern() {
        let mut builder = PropertySearchBuilder::new();
        builder.add_text_search("villa");
        let (query, params) = builder.build();
        assert!(query.contains("p.name ILIKE $1"));
        assert!(query.contains("u.email ILIKE $5"));
        // non-numeric term adds no equality clauses
        assert!(!query.contains("p.regular_price ="));
        assert_eq!(params[0], SqlParam::Text("%villa%".to_string()));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_builder_numeric_search_adds_equality() {
        let mut builder = PropertySearchBuilder::new();
        builder.add_text_search("3");
        let (query, params) = builder.build();
        assert!(query.contains("p.regular_price = $6"));
        assert!(query.contains("p.bedroom = $8"));
        assert_eq!(params.len(), 9);
        assert_eq!(params[5], SqlParam::Int(3));
    }

    #[test]
    fn test_builder_price_range_matches_either_price() {
        let mut builder = PropertySearchBuilder::new();
        builder.add_price_range(Some(1000), Some(5000));
        let (query, params) = builder.build();
        assert!(query.contains("(p.regular_price >= $1 OR p.discount_price >= $2)"));
        assert!(query.contains("(p.regular_price <= $3 OR p.discount_price <= $4)"));
        assert_eq!(params[0], SqlParam::Int(1000));
        assert_eq!(params[2], SqlParam::Int(5000));
    }

    #[test]
    fn test_builder_combined_filters_and_join() {
        let mut builder = PropertySearchBuilder::new();
        builder.add_type_filter("rent");
        builder.add_flag("furnished", true);
        builder.add_count_range("bedroom", Some(2), None);
        let (query, params) = builder.build();
        assert!(query.contains("p.property_type = $1 AND p.furnished = $2 AND p.bedroom >= $3"));
        assert_eq!(
            params,
            vec![
                SqlParam::Text("rent".to_string()),
                SqlParam::Bool(true),
                SqlParam::Int(2),
            ]
        );
    }

    #[test]
    fn test_builder_owner_scope() {
        let owner = Uuid::new_v4();
        let mut builder = PropertySearchBuilder::new();
        builder.set_owner_scope(owner);
        let (query, params) = builder.build();
        assert!(query.contains("p.owner_id = $1"));
        assert_eq!(params[0], SqlParam::Uuid(owner));
    }

    #[test]
    fn test_builder_pagination_offset() {
        let mut builder = PropertySearchBuilder::new();
        builder.set_pagination(3, 20);
        let (query, _) = builder.build();
        assert!(query.contains("LIMIT 20 OFFSET 40"));
    }

    #[test]
    fn test_count_query_shares_filters_without_ordering() {
        let mut builder = PropertySearchBuilder::new();
        builder.add_type_filter("sale");
        builder.set_pagination(2, 10);
        let (count_query, params) = builder.build_count();
        assert!(count_query.starts_with("SELECT COUNT(*)"));
        assert!(count_query.contains("p.property_type = $1"));
        assert!(!count_query.contains("LIMIT"));
        assert!(!count_query.contains("ORDER BY"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_sort_by_parsing() {
        assert_eq!(SortBy::parse("latest").unwrap(), SortBy::Latest);
        assert_eq!(SortBy::parse("oldest").unwrap(), SortBy::Oldest);
        assert_eq!(
            SortBy::parse("price_low_to_high").unwrap(),
            SortBy::PriceLowToHigh
        );
        assert_eq!(
            SortBy::parse("price_high_to_low").unwrap(),
            SortBy::PriceHighToLow
        );
        assert!(SortBy::parse("newest").is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let query = SearchQuery::validate(SearchParams::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.sort_by, SortBy::Latest);
        assert!(!query.datatable);
    }

    #[test]
    fn test_validate_rejects_zero_page_and_oversized_limit() {
        let params = SearchParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(SearchQuery::validate(params).is_err());

        let params = SearchParams {
            limit: Some(101),
            ..Default::default()
        };
        assert!(SearchQuery::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_price_range() {
        let params = SearchParams {
            min_price: Some(5000),
            max_price: Some(1000),
            ..Default::default()
        };
        assert!(SearchQuery::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let params = SearchParams {
            property_type: Some("lease".to_string()),
            ..Default::default()
        };
        assert!(SearchQuery::validate(params).is_err());
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: SearchParams = serde_json::from_str(
            r#"{"q":"beach","type":"sale","minPrice":100,"maxBedroom":4,"sortBy":"oldest","source":"datatable"}"#,
        )
        .unwrap();
        assert_eq!(params.q.as_deref(), Some("beach"));
        assert_eq!(params.property_type.as_deref(), Some("sale"));
        assert_eq!(params.min_price, Some(100));
        assert_eq!(params.max_bedroom, Some(4));
        let query = SearchQuery::validate(params).unwrap();
        assert_eq!(query.sort_by, SortBy::Oldest);
        assert!(query.datatable);
    }

    proptest! {
        // Placeholders must be numbered consecutively from $1 with one
        // bind value each, whatever combination of filters is active
        #[test]
        fn prop_placeholder_count_matches_params(
            q in proptest::option::of("[a-z0-9]{1,8}"),
            type_filter in proptest::option::of(prop_oneof!["sale".prop_map(String::from), "rent".prop_map(String::from)]),
            min_price in proptest::option::of(0i64..10_000),
            furnished in proptest::option::of(any::<bool>()),
        ) {
            let mut builder = PropertySearchBuilder::new();
            if let Some(ref q) = q {
                builder.add_text_search(q);
            }
            if let Some(ref t) = type_filter {
                builder.add_type_filter(t);
            }
            builder.add_price_range(min_price, None);
            if let Some(f) = furnished {
                builder.add_flag("furnished", f);
            }
            let (query, params) = builder.build();
            for i in 1..=params.len() {
                let placeholder = format!("${}", i);
                prop_assert!(query.contains(&placeholder));
            }
            let next_placeholder = format!("${}", params.len() + 1);
            prop_assert!(!query.contains(&next_placeholder));
        }

        // Page/limit always produce OFFSET = (page-1)*limit
        #[test]
        fn prop_pagination_offset(page in 1u32..1000, limit in 1u32..100) {
            let mut builder = PropertySearchBuilder::new();
            builder.set_pagination(page, limit);
            let (query, _) = builder.build();
            let suffix = format!("LIMIT {} OFFSET {}", limit, (page - 1) * limit);
            prop_assert!(query.ends_with(&suffix));
        }
    }
}
