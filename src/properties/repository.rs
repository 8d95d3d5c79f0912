// Database access for property listings

use sqlx::postgres::Postgres;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::properties::models::PropertyRow;
use crate::query::{PropertySearchBuilder, SqlParam};

const PROPERTY_COLUMNS: &str = "p.id, p.owner_id, p.name, p.description, p.address, \
     p.property_type, p.regular_price, p.discount_price, p.bedroom, p.bathroom, \
     p.furnished, p.parking, p.offer, p.images, p.created_at, p.updated_at, \
     u.username AS owner_username, u.email AS owner_email";

pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the assembled search: page of rows plus the matching total,
    /// both inside one transaction so they agree
    pub async fn search(
        &self,
        builder: &PropertySearchBuilder,
    ) -> Result<(Vec<PropertyRow>, i64), ApiError> {
        let (sql, params) = builder.build();
        let (count_sql, count_params) = builder.build_count();

        let mut tx = self.pool.begin().await?;

        let mut query = sqlx::query_as::<Postgres, PropertyRow>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        let rows = query.fetch_all(&mut *tx).await?;

        let mut count_query = sqlx::query_scalar::<Postgres, i64>(&count_sql);
        for param in &count_params {
            count_query = bind_scalar(count_query, param);
        }
        let total = count_query.fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok((rows, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<PropertyRow>, ApiError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {} FROM properties p JOIN users u ON u.id = p.owner_id WHERE p.id = $1",
            PROPERTY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Owner id of a listing, for ownership checks
    pub async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>, ApiError> {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM properties WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(owner)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
        address: &str,
        property_type: &str,
        regular_price: i64,
        discount_price: Option<i64>,
        bedroom: i32,
        bathroom: i32,
        furnished: bool,
        parking: bool,
        offer: bool,
        images: &[String],
    ) -> Result<Uuid, ApiError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO properties \
             (owner_id, name, description, address, property_type, regular_price, \
              discount_price, bedroom, bathroom, furnished, parking, offer, images) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id",
        )
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(address)
        .bind(property_type)
        .bind(regular_price)
        .bind(discount_price)
        .bind(bedroom)
        .bind(bathroom)
        .bind(furnished)
        .bind(parking)
        .bind(offer)
        .bind(images)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Partial update; absent fields keep their current value
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        address: Option<&str>,
        property_type: Option<&str>,
        regular_price: Option<i64>,
        discount_price: Option<i64>,
        bedroom: Option<i32>,
        bathroom: Option<i32>,
        furnished: Option<bool>,
        parking: Option<bool>,
        offer: Option<bool>,
    ) -> Result<Option<PropertyRow>, ApiError> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE properties SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             address = COALESCE($4, address), \
             property_type = COALESCE($5, property_type), \
             regular_price = COALESCE($6, regular_price), \
             discount_price = COALESCE($7, discount_price), \
             bedroom = COALESCE($8, bedroom), \
             bathroom = COALESCE($9, bathroom), \
             furnished = COALESCE($10, furnished), \
             parking = COALESCE($11, parking), \
             offer = COALESCE($12, offer), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(address)
        .bind(property_type)
        .bind(regular_price)
        .bind(discount_price)
        .bind(bedroom)
        .bind(bathroom)
        .bind(furnished)
        .bind(parking)
        .bind(offer)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Property".to_string()));
        }
        Ok(())
    }

    /// Append image URLs, refusing to grow past the 5-image cap
    ///
    /// The cap is enforced in the UPDATE predicate so concurrent attaches
    /// cannot overshoot it.
    pub async fn attach_images(&self, id: Uuid, images: &[String]) -> Result<(), ApiError> {
        let result = sqlx::query(
            "UPDATE properties SET images = images || $2, updated_at = NOW() \
             WHERE id = $1 AND COALESCE(array_length(images, 1), 0) + $3 <= 5",
        )
        .bind(id)
        .bind(images)
        .bind(images.len() as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::field(
                "images",
                "A property can hold at most 5 images",
            ));
        }
        Ok(())
    }

    /// Remove one image URL; false when the URL is not attached
    pub async fn detach_image(&self, id: Uuid, image: &str) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE properties SET images = array_remove(images, $2), updated_at = NOW() \
             WHERE id = $1 AND $2 = ANY(images)",
        )
        .bind(id)
        .bind(image)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

type PropertyQuery<'q> = sqlx::query::QueryAs<
    'q,
    Postgres,
    PropertyRow,
    sqlx::postgres::PgArguments,
>;

type ScalarQuery<'q> =
    sqlx::query::QueryScalar<'q, Postgres, i64, sqlx::postgres::PgArguments>;

fn bind_param_as<'q>(query: PropertyQuery<'q>, param: &SqlParam) -> PropertyQuery<'q> {
    match param {
        SqlParam::Text(s) => query.bind(s.clone()),
        SqlParam::Int(i) => query.bind(*i),
        SqlParam::Bool(b) => query.bind(*b),
        SqlParam::Uuid(u) => query.bind(*u),
    }
}

fn bind_scalar<'q>(query: ScalarQuery<'q>, param: &SqlParam) -> ScalarQuery<'q> {
    match param {
        SqlParam::Text(s) => query.bind(s.clone()),
        SqlParam::Int(i) => query.bind(*i),
        SqlParam::Bool(b) => query.bind(*b),
        SqlParam::Uuid(u) => query.bind(*u),
    }
}
