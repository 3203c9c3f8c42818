use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Decides whether a bearer token may reach the `/api` routes.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> bool;
}

/// Accepts any non-empty token. Used when no JWT secret is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAnyToken;

impl TokenValidator for AcceptAnyToken {
    fn validate(&self, token: &str) -> bool {
        !token.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, expiry_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// HS256 tokens signed with a shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default()).map(|data| data.claims)
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Rejected JWT: {}", e);
                false
            }
        }
    }
}

/// JWT validation when a secret is configured, otherwise the non-empty check
pub fn validator_from_config(security: &SecurityConfig) -> Arc<dyn TokenValidator> {
    match security.jwt_secret.as_deref().map(JwtValidator::new) {
        Some(Ok(validator)) => Arc::new(validator),
        Some(Err(e)) => {
            tracing::warn!("{}; falling back to non-empty token check", e);
            Arc::new(AcceptAnyToken)
        }
        None => Arc::new(AcceptAnyToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_any_rejects_blank() {
        assert!(AcceptAnyToken.validate("anything"));
        assert!(!AcceptAnyToken.validate(""));
        assert!(!AcceptAnyToken.validate("   "));
    }

    #[test]
    fn jwt_round_trip() {
        let validator = JwtValidator::new("test-secret").unwrap();
        let token = validator.generate(&Claims::new("ada", 1)).unwrap();
        assert!(validator.validate(&token));
        assert_eq!(validator.decode(&token).unwrap().sub, "ada");

        let other = JwtValidator::new("other-secret").unwrap();
        assert!(!other.validate(&token));
        assert!(!validator.validate("not-a-jwt"));
    }

    #[test]
    fn expired_jwt_rejected() {
        let validator = JwtValidator::new("test-secret").unwrap();
        let token = validator.generate(&Claims::new("ada", -2)).unwrap();
        assert!(!validator.validate(&token));
    }

    #[test]
    fn empty_secret_is_invalid() {
        assert!(matches!(JwtValidator::new(""), Err(JwtError::InvalidSecret)));
    }
}
