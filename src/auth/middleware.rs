// Request extractors for authentication and authorization

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::token::TokenService;
use crate::error::ApiError;

/// The caller's identity, taken from a validated bearer token
///
/// Adding this to a handler's arguments makes the route require
/// authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Allow access when the caller owns the resource or is an admin
    pub fn ensure_owner(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }

    /// Allow access to admins only
    pub fn ensure_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(parts: &Parts, tokens: &TokenService) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
    let claims = tokens.validate_access_token(token)?;
    Ok(AuthenticatedUser {
        id: claims.sub,
        role: claims.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        authenticate(parts, &tokens).map_err(IntoResponse::into_response)
    }
}

/// An authenticated caller holding the admin role
///
/// Routes taking this extractor reject non-admins with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        user.ensure_admin().map_err(IntoResponse::into_response)?;
        Ok(AdminUser(user))
    }
}

/// Optional authentication
///
/// Yields the caller's identity when a valid bearer token is present and
/// None otherwise; the request is never rejected. Used by routes whose
/// response varies by caller, like the property search datatable scope.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        Ok(MaybeUser(authenticate(parts, &tokens).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let admin = user("admin");
        assert!(admin.ensure_owner(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_owner_passes_ownership() {
        let caller = user("user");
        assert!(caller.ensure_owner(caller.id).is_ok());
    }

    #[test]
    fn test_non_owner_is_denied() {
        let caller = user("user");
        assert!(matches!(
            caller.ensure_owner(Uuid::new_v4()),
            Err(ApiError::PermissionDenied)
        ));
    }

    #[test]
    fn test_ensure_admin() {
        assert!(user("admin").ensure_admin().is_ok());
        assert!(user("user").ensure_admin().is_err());
        // Role names are exact matches
        assert!(user("Admin").ensure_admin().is_err());
    }
}
