// Database access for user management

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};
use crate::query::ListQuery;
use crate::users::models::UserRow;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.avatar, u.is_verified, \
     u.created_at, u.updated_at, u.role_id, r.name AS role_name";

pub struct UserAdminRepository {
    pool: PgPool,
}

impl UserAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paginated search over username, email and role name
    ///
    /// Ordered by role name then newest first, matching the admin table.
    pub async fn search(&self, query: &ListQuery) -> Result<(Vec<UserRow>, i64), ApiError> {
        let pattern = query.q.as_ref().map(|q| format!("%{}%", q));
        let mut tx = self.pool.begin().await?;

        let users = match &pattern {
            Some(p) => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id \
                     WHERE u.username ILIKE $1 OR u.email ILIKE $1 OR r.name ILIKE $1 \
                     ORDER BY r.name ASC, u.created_at DESC LIMIT $2 OFFSET $3",
                    USER_COLUMNS
                ))
                .bind(p)
                .bind(query.limit as i64)
                .bind(query.offset())
                .fetch_all(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id \
                     ORDER BY r.name ASC, u.created_at DESC LIMIT $1 OFFSET $2",
                    USER_COLUMNS
                ))
                .bind(query.limit as i64)
                .bind(query.offset())
                .fetch_all(&mut *tx)
                .await?
            }
        };

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users u JOIN roles r ON r.id = u.role_id \
                     WHERE u.username ILIKE $1 OR u.email ILIKE $1 OR r.name ILIKE $1",
                )
                .bind(p)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok((users, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<UserRow>, ApiError> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Which of username/email are taken by another account
    pub async fn find_conflicts(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<FieldErrors, ApiError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT username, email FROM users \
             WHERE (username = $1 OR email = $2) AND ($3::uuid IS NULL OR id != $3)",
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        let mut errors = FieldErrors::new();
        for (taken_username, taken_email) in rows {
            if username == Some(taken_username.as_str()) {
                errors.insert("username".to_string(), "Username already in use".to_string());
            }
            if email == Some(taken_email.as_str()) {
                errors.insert("email".to_string(), "Email already in use".to_string());
            }
        }
        Ok(errors)
    }

    pub async fn role_exists(&self, role_id: Uuid) -> Result<bool, ApiError> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
                .bind(role_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.unwrap_or(false))
    }

    /// Insert an already-verified account (admin creation path)
    pub async fn create_verified(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        avatar: &str,
        role_id: Uuid,
    ) -> Result<Uuid, ApiError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, avatar, role_id, is_verified) \
             VALUES ($1, $2, $3, $4, $5, TRUE) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(avatar)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_conflict)?;
        Ok(id)
    }

    /// Partial update; absent fields keep their current value
    pub async fn update(
        &self,
        id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
        avatar: Option<&str>,
        role_id: Option<Uuid>,
    ) -> Result<Option<UserRow>, ApiError> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE users SET \
             username = COALESCE($2, username), \
             email = COALESCE($3, email), \
             password_hash = COALESCE($4, password_hash), \
             avatar = COALESCE($5, avatar), \
             role_id = COALESCE($6, role_id), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(avatar)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_conflict)?;

        match updated {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }

    /// Delete an account; owned properties and sessions cascade
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User".to_string()));
        }
        Ok(())
    }
}

/// Translate a unique violation into the field the admin table highlights
fn map_user_conflict(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(name) if name.contains("email") => "email",
                _ => "username",
            };
            return ApiError::conflict(
                field,
                &format!(
                    "{} already in use",
                    if field == "email" { "Email" } else { "Username" }
                ),
            );
        }
    }
    ApiError::from(err)
}
