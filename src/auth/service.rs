// Authentication flows

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use crate::auth::error::AuthError;
use crate::auth::models::{
    EmailRequest, ResetPasswordRequest, SessionResponse, SigninRequest, SignupRequest,
    TokenResponse,
};
use crate::auth::password;
use crate::auth::repository::{TokenRepository, UserRepository};
use crate::auth::token::{generate_one_time_token, TokenService};
use crate::error::ApiError;
use crate::mailer::Mailer;

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Authentication service wiring repositories, tokens and mail together
pub struct AuthService {
    users: UserRepository,
    tokens: TokenRepository,
    token_service: TokenService,
    mailer: Arc<Mailer>,
    default_avatar_url: String,
}

impl AuthService {
    pub fn new(state: &crate::AppState) -> Self {
        Self {
            users: UserRepository::new(state.db.clone()),
            tokens: TokenRepository::new(state.db.clone()),
            token_service: state.tokens.clone(),
            mailer: state.mailer.clone(),
            default_avatar_url: state.config.default_avatar_url.clone(),
        }
    }

    /// Register a new account and send the verification email
    ///
    /// The account starts unverified and cannot sign in until the emailed
    /// link is used.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), AuthError> {
        let conflicts = self
            .users
            .find_conflicts(&request.username, &request.email)
            .await?;
        if !conflicts.is_empty() {
            return Err(AuthError::Api(ApiError::Conflict(conflicts)));
        }

        let password_hash = password::hash_password(&request.password)?;
        let token = generate_one_time_token();
        let expires = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

        let user_id = self
            .users
            .create_unverified(
                &request.username,
                &request.email,
                &password_hash,
                &self.default_avatar_url,
                &token,
                expires,
            )
            .await?;

        self.mailer
            .send_verification(&request.email, &request.username, &token)
            .await?;

        info!(user_id = %user_id, "account registered, verification email sent");
        Ok(())
    }

    /// Consume a verification link and mark the account verified
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        if !self.users.verify_by_token(token).await? {
            return Err(AuthError::InvalidVerificationToken);
        }
        info!("email verified");
        Ok(())
    }

    /// Re-issue the verification token for an unverified account
    pub async fn resend_verification(&self, request: &EmailRequest) -> Result<(), AuthError> {
        let token = generate_one_time_token();
        let expires = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

        let username = self
            .users
            .replace_verification_token(&request.email, &token, expires)
            .await?
            .ok_or_else(|| AuthError::Api(ApiError::field("email", "Email is not registered")))?;

        self.mailer
            .send_verification(&request.email, &username, &token)
            .await?;

        info!("verification email re-sent");
        Ok(())
    }

    /// Sign in with email and password
    ///
    /// Returns the session payload plus the refresh token destined for the
    /// HttpOnly cookie. One account can hold several live sessions.
    pub async fn signin(
        &self,
        request: &SigninRequest,
    ) -> Result<(SessionResponse, String), AuthError> {
        let user = self
            .users
            .find_verified_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&request.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let (access, refresh) = self
            .token_service
            .generate_token_pair(user.id, &user.role_name)?;
        self.tokens
            .store(user.id, &refresh, self.token_service.refresh_expiry())
            .await?;

        info!(user_id = %user.id, "signed in");
        Ok((
            SessionResponse {
                id: user.id,
                username: user.username,
                email: user.email,
                avatar: user.avatar,
                role: user.role_name,
                token: access,
            },
            refresh,
        ))
    }

    /// Revoke the session behind a refresh token
    ///
    /// A token that matches no stored row is treated as invalid so a
    /// replayed signout cannot look successful.
    pub async fn signout(&self, refresh_token: &str) -> Result<(), AuthError> {
        if self.tokens.revoke(refresh_token).await? == 0 {
            return Err(AuthError::InvalidRefreshToken);
        }
        info!("signed out");
        Ok(())
    }

    /// Mint a fresh access token from a stored refresh token
    ///
    /// The refresh token itself is not rotated; it stays valid until
    /// signout or expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let stored = self
            .tokens
            .find_valid(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Signature and expiry are checked even though the row matched,
        // so a forged token with a colliding hash never passes
        self.token_service.validate_refresh_token(refresh_token)?;

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let token = self
            .token_service
            .generate_access_token(user.id, &user.role_name)?;

        info!(user_id = %user.id, "access token refreshed");
        Ok(TokenResponse { token })
    }

    /// Issue a password reset token and email the link
    pub async fn forgot_password(&self, request: &EmailRequest) -> Result<(), AuthError> {
        let token = generate_one_time_token();
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        let username = self
            .users
            .replace_reset_token(&request.email, &token, expires)
            .await?
            .ok_or_else(|| AuthError::Api(ApiError::field("email", "Email is not registered")))?;

        self.mailer
            .send_password_reset(&request.email, &username, &token)
            .await?;

        info!("password reset email sent");
        Ok(())
    }

    /// Consume a reset link and set the new password
    pub async fn reset_password(
        &self,
        token: &str,
        request: &ResetPasswordRequest,
    ) -> Result<(), AuthError> {
        let password_hash = password::hash_password(&request.new_password)?;
        if !self
            .users
            .reset_password_by_token(token, &password_hash)
            .await?
        {
            return Err(AuthError::InvalidResetToken);
        }
        info!("password reset");
        Ok(())
    }
}
