// Database repositories for accounts and refresh tokens

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{AuthUser, RefreshTokenRow};
use crate::error::{ApiError, FieldErrors};

const AUTH_USER_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.avatar, \
     r.name AS role_name, u.is_verified";

/// Account repository used by the auth flows
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Report which of username/email are already taken
    ///
    /// The unique constraints remain the authority; this pre-check exists to
    /// report both collisions at once.
    pub async fn find_conflicts(
        &self,
        username: &str,
        email: &str,
    ) -> Result<FieldErrors, AuthError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT username, email FROM users WHERE username = $1 OR email = $2")
                .bind(username)
                .bind(email)
                .fetch_all(&self.pool)
                .await?;

        let mut errors = FieldErrors::new();
        for (taken_username, taken_email) in rows {
            if taken_username == username {
                errors.insert("username".to_string(), "Username already in use".to_string());
            }
            if taken_email == email {
                errors.insert("email".to_string(), "Email already in use".to_string());
            }
        }
        Ok(errors)
    }

    /// Insert a new unverified account with the default "user" role
    pub async fn create_unverified(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        avatar: &str,
        verification_token: &str,
        token_expires: DateTime<Utc>,
    ) -> Result<Uuid, AuthError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users \
             (username, email, password_hash, avatar, role_id, verification_token, verification_token_expires) \
             VALUES ($1, $2, $3, $4, (SELECT id FROM roles WHERE name = 'user'), $5, $6) \
             RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(avatar)
        .bind(verification_token)
        .bind(token_expires)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A concurrent signup can slip past the pre-check; the unique
            // constraint reports it here
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let field = match db_err.constraint() {
                        Some(name) if name.contains("email") => "email",
                        _ => "username",
                    };
                    return AuthError::Api(ApiError::conflict(
                        field,
                        if field == "email" {
                            "Email already in use"
                        } else {
                            "Username already in use"
                        },
                    ));
                }
            }
            AuthError::from(e)
        })?;

        Ok(id)
    }

    /// Mark the account behind a verification token as verified
    ///
    /// Clearing the token in the same statement makes the link single-use.
    /// Returns false when no account matches an unexpired token.
    pub async fn verify_by_token(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET is_verified = TRUE, \
             verification_token = NULL, verification_token_expires = NULL \
             WHERE verification_token = $1 AND verification_token_expires > NOW()",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Issue a fresh verification token for an unverified account
    ///
    /// Returns the username for the email, or None when the email is not
    /// registered or already verified.
    pub async fn replace_verification_token(
        &self,
        email: &str,
        token: &str,
        token_expires: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let username: Option<String> = sqlx::query_scalar(
            "UPDATE users SET verification_token = $2, verification_token_expires = $3 \
             WHERE email = $1 AND is_verified = FALSE \
             RETURNING username",
        )
        .bind(email)
        .bind(token)
        .bind(token_expires)
        .fetch_optional(&self.pool)
        .await?;

        Ok(username)
    }

    /// Find a verified account by email, with its role name
    pub async fn find_verified_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let user = sqlx::query_as::<_, AuthUser>(&format!(
            "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id \
             WHERE u.email = $1 AND u.is_verified = TRUE",
            AUTH_USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find an account by id, with its role name
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let user = sqlx::query_as::<_, AuthUser>(&format!(
            "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
            AUTH_USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Issue a password reset token for a verified account
    pub async fn replace_reset_token(
        &self,
        email: &str,
        token: &str,
        token_expires: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let username: Option<String> = sqlx::query_scalar(
            "UPDATE users SET reset_token = $2, reset_token_expires = $3 \
             WHERE email = $1 AND is_verified = TRUE \
             RETURNING username",
        )
        .bind(email)
        .bind(token)
        .bind(token_expires)
        .fetch_optional(&self.pool)
        .await?;

        Ok(username)
    }

    /// Set a new password for the account behind a reset token
    ///
    /// The token is cleared in the same statement. Returns false when no
    /// account matches an unexpired token.
    pub async fn reset_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, \
             reset_token = NULL, reset_token_expires = NULL \
             WHERE reset_token = $1 AND reset_token_expires > NOW()",
        )
        .bind(token)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Refresh token repository
///
/// Tokens are stored as SHA-256 digests; a database leak does not yield
/// usable sessions.
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Store a refresh token for a new session
    pub async fn store(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(Self::hash_token(token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a stored, unexpired refresh token
    pub async fn find_valid(&self, token: &str) -> Result<Option<RefreshTokenRow>, AuthError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, user_id, expires_at FROM refresh_tokens \
             WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a stored refresh token, returning how many rows matched
    ///
    /// Zero rows means the token was never issued or is already revoked.
    pub async fn revoke(&self, token: &str) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Purge tokens past their expiry
    pub async fn delete_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hash_is_hex_sha256() {
        let hash = TokenRepository::hash_token("some-refresh-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable digest for a known input
        assert_eq!(
            TokenRepository::hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_token_hash_differs_per_token() {
        assert_ne!(
            TokenRepository::hash_token("token-a"),
            TokenRepository::hash_token("token-b")
        );
    }
}
