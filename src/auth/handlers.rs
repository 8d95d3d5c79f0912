// HTTP handlers for the /api/auth routes

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::auth::error::AuthError;
use crate::auth::models::{
    EmailRequest, ResetPasswordRequest, SessionResponse, SigninRequest, SignupRequest,
    TokenResponse,
};
use crate::auth::service::AuthService;
use crate::models::ApiResponse;
use crate::AppState;

const REFRESH_COOKIE: &str = "refreshToken";

/// Read the refresh token out of the Cookie header
fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == REFRESH_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Set-Cookie value installing the refresh token for the session
fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        REFRESH_COOKIE, token, max_age_secs
    )
}

/// Set-Cookie value that removes the refresh token
fn clear_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", REFRESH_COOKIE)
}

/// Handler for POST /api/auth/signup
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created, verification email sent"),
        (status = 400, description = "Validation errors"),
        (status = 409, description = "Username or email already in use")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    request.validate()?;
    AuthService::new(&state).signup(&request).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Please check your email to verify your account",
    ))
}

/// Handler for POST /api/auth/verify-email/{token}
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    AuthService::new(&state).verify_email(&token).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Email verified successfully",
    ))
}

/// Handler for POST /api/auth/resend-verification
pub async fn resend_verification_handler(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse, AuthError> {
    request.validate()?;
    AuthService::new(&state).resend_verification(&request).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Please check your email to verify your account",
    ))
}

/// Handler for POST /api/auth/signin
/// Returns the session payload and installs the refresh cookie
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in successfully", body = SessionResponse),
        (status = 401, description = "Email or password is invalid")
    ),
    tag = "auth"
)]
pub async fn signin_handler(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> Result<Response, AuthError> {
    request.validate()?;
    let (session, refresh_token) = AuthService::new(&state).signin(&request).await?;

    let cookie = session_cookie(&refresh_token, state.tokens.refresh_ttl_secs());
    let mut response = ApiResponse::<SessionResponse>::with_data(
        StatusCode::OK,
        "Signed in successfully",
        session,
    )
    .into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?,
    );
    Ok(response)
}

/// Handler for POST /api/auth/signout
/// Requires a live access token; revokes the refresh token and clears
/// the cookie
pub async fn signout_handler(
    State(state): State<AppState>,
    _caller: crate::auth::middleware::AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let refresh_token = refresh_cookie(&headers).ok_or(AuthError::MissingRefreshToken)?;
    AuthService::new(&state).signout(&refresh_token).await?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&clear_cookie())
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?,
    );
    Ok(response)
}

/// Handler for POST /api/auth/refresh-token
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenResponse),
        (status = 401, description = "Refresh token missing, invalid or expired")
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let refresh_token = refresh_cookie(&headers).ok_or(AuthError::MissingRefreshToken)?;
    let token = AuthService::new(&state).refresh(&refresh_token).await?;
    Ok(ApiResponse::<TokenResponse>::with_data(
        StatusCode::OK,
        "Token refreshed successfully",
        token,
    ))
}

/// Handler for POST /api/auth/request-reset-password
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse, AuthError> {
    request.validate()?;
    AuthService::new(&state).forgot_password(&request).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Please check your email to reset your password",
    ))
}

/// Handler for POST /api/auth/reset-password/{token}
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    request.validate()?;
    AuthService::new(&state).reset_password(&token, &request).await?;
    Ok(ApiResponse::<()>::message(
        StatusCode::OK,
        "Password reset successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc123; lang=en"),
        );
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_refresh_cookie_missing() {
        let headers = HeaderMap::new();
        assert_eq!(refresh_cookie(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(refresh_cookie(&headers), None);
    }

    #[test]
    fn test_refresh_cookie_empty_value_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(refresh_cookie(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 604800);
        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
