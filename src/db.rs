// Database pool setup and seed data

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::ApiError;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Remove all application data, child tables first
///
/// Used by the seed command before inserting fixtures.
pub async fn clear_database(pool: &PgPool) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM refresh_tokens")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM properties")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM roles").execute(&mut *tx).await?;

    tx.commit().await?;
    tracing::info!("Database cleared");
    Ok(())
}

/// Insert the base roles and two known accounts
///
/// Admin signs in as admin@email.com, the regular account as user@email.com,
/// both with the password "password123" and already verified.
pub async fn seed_database(pool: &PgPool, default_avatar_url: &str) -> Result<(), ApiError> {
    let password_hash = crate::auth::password::hash_password("password123")?;

    let mut tx = pool.begin().await?;

    let admin_role_id: uuid::Uuid =
        sqlx::query_scalar("INSERT INTO roles (name) VALUES ('admin') RETURNING id")
            .fetch_one(&mut *tx)
            .await?;
    let user_role_id: uuid::Uuid =
        sqlx::query_scalar("INSERT INTO roles (name) VALUES ('user') RETURNING id")
            .fetch_one(&mut *tx)
            .await?;

    sqlx::query(
        "INSERT INTO users (username, email, password_hash, avatar, role_id, is_verified) \
         VALUES ($1, $2, $3, $4, $5, TRUE)",
    )
    .bind("admin")
    .bind("admin@email.com")
    .bind(&password_hash)
    .bind(default_avatar_url)
    .bind(admin_role_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO users (username, email, password_hash, avatar, role_id, is_verified) \
         VALUES ($1, $2, $3, $4, $5, TRUE)",
    )
    .bind("user")
    .bind("user@email.com")
    .bind(&password_hash)
    .bind(default_avatar_url)
    .bind(user_role_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("Seed data inserted");
    Ok(())
}
