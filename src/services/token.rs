//! Bearer token issuing and validation
//!
//! Tokens are HS256-signed JWTs whose subject is the user's database id.
//! Nothing is stored server side; the user is re-read from the database on
//! every authenticated request.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user's database id
    pub sub: i64,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
}

/// Errors from token handling
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature, format or expiry check failed
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signs and validates bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::days(expiry_days),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_expiry_days)
    }

    /// Issue a token for the given user
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Validate a token and return its claims. Expired tokens are rejected.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let tokens = TokenService::new("test-secret", 30);
        let token = tokens.issue(42).expect("Failed to issue token");

        let claims = tokens.validate(&token).expect("Token should validate");
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("secret-a", 30).issue(1).unwrap();
        assert!(TokenService::new("secret-b", 30).validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Expiry well past the default leeway of 60 seconds
        let tokens = TokenService::new("test-secret", -1);
        let token = tokens.issue(1).unwrap();
        assert!(tokens.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new("test-secret", 30);
        assert!(tokens.validate("not.a.token").is_err());
        assert!(tokens.validate("").is_err());
    }
}
