// JWT signing/validation and one-time token generation

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::config::JwtConfig;

/// JWT claims carried by both access and refresh tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Role name at sign-in time
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token service for JWT operations
///
/// Access and refresh tokens are signed with separate secrets; a token of
/// one kind never validates as the other.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Generate a short-lived access token
    pub fn generate_access_token(&self, user_id: Uuid, role: &str) -> Result<String, AuthError> {
        self.sign(user_id, role, &self.access_secret, self.access_ttl_secs)
    }

    /// Generate a refresh token
    pub fn generate_refresh_token(&self, user_id: Uuid, role: &str) -> Result<String, AuthError> {
        self.sign(user_id, role, &self.refresh_secret, self.refresh_ttl_secs)
    }

    /// Generate both tokens for a fresh sign-in
    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        role: &str,
    ) -> Result<(String, String), AuthError> {
        let access = self.generate_access_token(user_id, role)?;
        let refresh = self.generate_refresh_token(user_id, role)?;
        Ok((access, refresh))
    }

    /// Validate an access token from the Authorization header
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        Self::validate(token, &self.access_secret)
            .map_err(|kind| match kind {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    /// Validate a refresh token from the session cookie
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        Self::validate(token, &self.refresh_secret)
            .map_err(|kind| match kind {
                ErrorKind::ExpiredSignature => AuthError::ExpiredRefreshToken,
                _ => AuthError::InvalidRefreshToken,
            })
    }

    /// When a refresh token issued now will expire
    pub fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.refresh_ttl_secs)
    }

    /// Refresh cookie lifetime in seconds, for Max-Age
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    fn sign(
        &self,
        user_id: Uuid,
        role: &str,
        secret: &str,
        ttl_secs: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    fn validate(token: &str, secret: &str) -> Result<Claims, ErrorKind> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| e.into_kind())
    }
}

/// Generate a 32-byte random token, hex encoded
///
/// Used for the email verification and password reset links.
pub fn generate_one_time_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new(&JwtConfig {
            access_secret: "test_access_secret_key".to_string(),
            refresh_secret: "test_refresh_secret_key".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604800,
        })
    }

    #[test]
    fn test_access_token_expiration_is_15_minutes() {
        let service = test_token_service();
        let token = service
            .generate_access_token(Uuid::new_v4(), "user")
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_expiration_is_7_days() {
        let service = test_token_service();
        let token = service
            .generate_refresh_token(Uuid::new_v4(), "user")
            .unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_token_claims_carry_identity_and_role() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(user_id, "admin").unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_access_and_refresh_secrets_are_separate() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();

        let access = service.generate_access_token(user_id, "user").unwrap();
        let refresh = service.generate_refresh_token(user_id, "user").unwrap();

        // Neither kind validates as the other
        assert!(matches!(
            service.validate_access_token(&refresh),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.validate_refresh_token(&access),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_expired_token_maps_to_expired_variant() {
        let service = TokenService::new(&JwtConfig {
            access_secret: "test_access_secret_key".to_string(),
            refresh_secret: "test_refresh_secret_key".to_string(),
            access_ttl_secs: -120,
            refresh_ttl_secs: -120,
        });
        let user_id = Uuid::new_v4();

        let access = service.generate_access_token(user_id, "user").unwrap();
        assert!(matches!(
            test_token_service().validate_access_token(&access),
            Err(AuthError::ExpiredToken)
        ));

        let refresh = service.generate_refresh_token(user_id, "user").unwrap();
        assert!(matches!(
            test_token_service().validate_refresh_token(&refresh),
            Err(AuthError::ExpiredRefreshToken)
        ));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();
        assert!(service.validate_access_token("").is_err());
        assert!(service.validate_access_token("not.a.token").is_err());
        assert!(service
            .validate_access_token("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    #[test]
    fn test_one_time_token_shape() {
        let token = generate_one_time_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_one_time_tokens_are_unique() {
        assert_ne!(generate_one_time_token(), generate_one_time_token());
    }

    proptest! {
        #[test]
        fn prop_token_pair_validates_and_differs(role in "[a-z]{3,10}") {
            let service = test_token_service();
            let user_id = Uuid::new_v4();
            let (access, refresh) = service.generate_token_pair(user_id, &role).unwrap();

            prop_assert_ne!(&access, &refresh);
            let claims = service.validate_access_token(&access).unwrap();
            prop_assert_eq!(claims.sub, user_id);
            prop_assert_eq!(claims.role, role.clone());
            prop_assert!(service.validate_refresh_token(&refresh).is_ok());
        }

        #[test]
        fn prop_random_strings_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert!(service.validate_access_token(&malformed).is_err());
            prop_assert!(service.validate_refresh_token(&malformed).is_err());
        }
    }
}
