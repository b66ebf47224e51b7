// JWT token generation and validation service

use crate::auth::error::AuthError;
use crate::config::JwtConfig;
use crate::users::{Role, User};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Distinguishes the two halves of a token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub typ: TokenType,
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
}

/// Freshly issued access + refresh tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token service for JWT operations
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    /// Access tokens expire in 15 minutes (900 seconds)
    pub const DEFAULT_ACCESS_TTL: i64 = 900;
    /// Refresh tokens expire in 7 days (604800 seconds)
    pub const DEFAULT_REFRESH_TTL: i64 = 604_800;

    /// Create a new TokenService with the default lifetimes
    pub fn new(secret: &str) -> Self {
        Self::with_durations(secret, Self::DEFAULT_ACCESS_TTL, Self::DEFAULT_REFRESH_TTL)
    }

    pub fn with_durations(secret: &str, access_seconds: i64, refresh_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_duration: access_seconds,
            refresh_token_duration: refresh_seconds,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::with_durations(
            &config.secret,
            config.access_ttl_seconds,
            config.refresh_ttl_seconds,
        )
    }

    fn sign(&self, user: &User, typ: TokenType, lifetime: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            typ,
            iat: now,
            exp: now + lifetime,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Generate an access token
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        self.sign(user, TokenType::Access, self.access_token_duration)
    }

    /// Generate a refresh token
    pub fn generate_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        self.sign(user, TokenType::Refresh, self.refresh_token_duration)
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
        })
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_typed(token, TokenType::Access)
    }

    /// Validate a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_typed(token, TokenType::Refresh)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode_claims(token)?;
        if claims.typ != expected {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes")
    }

    fn test_user(id: i32, email: &str, role: Role) -> User {
        User {
            id,
            email: email.to_string(),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_expiration_is_15_minutes() {
        let service = test_token_service();
        let token = service
            .generate_access_token(&test_user(1, "test@example.com", Role::User))
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.typ, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_expiration_is_7_days() {
        let service = test_token_service();
        let token = service
            .generate_refresh_token(&test_user(1, "test@example.com", Role::User))
            .unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 604800);
        assert_eq!(claims.typ, TokenType::Refresh);
    }

    #[test]
    fn test_token_claims_carry_identity_and_role() {
        let service = test_token_service();
        let pair = service
            .generate_token_pair(&test_user(42, "admin@example.com", Role::Admin))
            .unwrap();

        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = test_token_service();
        let pair = service
            .generate_token_pair(&test_user(1, "test@example.com", Role::User))
            .unwrap();

        assert_eq!(
            service.validate_access_token(&pair.refresh_token),
            Err(AuthError::WrongTokenType)
        );
        assert_eq!(
            service.validate_refresh_token(&pair.access_token),
            Err(AuthError::WrongTokenType)
        );
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        assert!(service.validate_access_token("").is_err());
        assert!(service.validate_access_token("not.a.token").is_err());
        assert!(service.validate_access_token("invalid_token_format").is_err());
        assert!(service
            .validate_access_token("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1");
        let service2 = TokenService::new("secret2");

        let token = service1
            .generate_access_token(&test_user(1, "test@example.com", Role::User))
            .unwrap();

        assert!(service1.validate_access_token(&token).is_ok());
        assert_eq!(
            service2.validate_access_token(&token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let claims = Claims {
            id: 1,
            email: "test@example.com".to_string(),
            role: Role::User,
            typ: TokenType::Access,
            iat: Utc::now().timestamp() - 1000,
            exp: Utc::now().timestamp() - 500,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret_key_for_testing_purposes".as_bytes()),
        )
        .unwrap();

        assert_eq!(
            test_token_service().validate_access_token(&token),
            Err(AuthError::ExpiredToken)
        );
    }

    proptest! {
        #[test]
        fn prop_access_token_round_trips_identity(
            user_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)",
            admin in any::<bool>()
        ) {
            let role = if admin { Role::Admin } else { Role::User };
            let service = test_token_service();
            let token = service.generate_access_token(&test_user(user_id, &email, role))?;
            let claims = service.validate_access_token(&token)?;

            prop_assert_eq!(claims.id, user_id);
            prop_assert_eq!(claims.email, email);
            prop_assert_eq!(claims.role, role);
            prop_assert_eq!(claims.exp - claims.iat, 900);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert!(service.validate_access_token(&malformed).is_err());
        }
    }
}
