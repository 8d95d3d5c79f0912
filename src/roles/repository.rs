// Database access for roles

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::query::ListQuery;
use crate::roles::models::Role;

pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All roles, name order
    pub async fn list_all(&self) -> Result<Vec<Role>, ApiError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    /// Paginated name search; page and total come from the same transaction
    pub async fn search(&self, query: &ListQuery) -> Result<(Vec<Role>, i64), ApiError> {
        let pattern = query.q.as_ref().map(|q| format!("%{}%", q));
        let mut tx = self.pool.begin().await?;

        let roles = match &pattern {
            Some(p) => {
                sqlx::query_as::<_, Role>(
                    "SELECT id, name FROM roles WHERE name ILIKE $1 \
                     ORDER BY name ASC LIMIT $2 OFFSET $3",
                )
                .bind(p)
                .bind(query.limit as i64)
                .bind(query.offset())
                .fetch_all(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, Role>(
                    "SELECT id, name FROM roles ORDER BY name ASC LIMIT $1 OFFSET $2",
                )
                .bind(query.limit as i64)
                .bind(query.offset())
                .fetch_all(&mut *tx)
                .await?
            }
        };

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE name ILIKE $1")
                    .bind(p)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM roles")
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok((roles, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Role>, ApiError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// Insert a role; a taken name surfaces as a conflict
    pub async fn create(&self, name: &str) -> Result<Role, ApiError> {
        sqlx::query_as::<_, Role>("INSERT INTO roles (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_name_conflict)
    }

    /// Rename a role; missing id → 404, taken name → 409
    pub async fn update(&self, id: Uuid, name: &str) -> Result<Role, ApiError> {
        sqlx::query_as::<_, Role>("UPDATE roles SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_name_conflict)?
            .ok_or_else(|| ApiError::NotFound("Role".to_string()))
    }

    /// Delete a role
    ///
    /// The RESTRICT foreign key blocks deleting a role that users still
    /// hold; that surfaces as a conflict, not a cascade.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return ApiError::conflict("role", "Role is still assigned to users");
                    }
                }
                ApiError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Role".to_string()));
        }
        Ok(())
    }
}

fn map_name_conflict(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ApiError::conflict("name", "Name already in use");
        }
    }
    ApiError::from(err)
}
