//! # JWT provider
//!
//! HS256 bearer tokens carrying the user id and role, plus Argon2 passwords.

use chrono::{Duration, Utc};
use domains::{AuthProvider, DomainError, Identity, Result, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{password, AuthError};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

pub struct JwtAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthProvider {
    /// `secret` signs and verifies every token; `ttl_hours` bounds their lifetime.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        Ok(password::hash_password(password)?)
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        password::verify_password(password, hash)
    }

    fn issue_token(&self, identity: Identity) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id,
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Token(err.to_string()).into())
    }

    fn verify_token(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            DomainError::Unauthorized("invalid or expired token".to_string())
        })?;
        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_identity() {
        let provider = JwtAuthProvider::new("test-secret", 1);
        let identity = Identity::new(Uuid::now_v7(), Role::Organization);

        let token = provider.issue_token(identity).unwrap();
        assert_eq!(provider.verify_token(&token).unwrap(), identity);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let issuer = JwtAuthProvider::new("secret-a", 1);
        let verifier = JwtAuthProvider::new("secret-b", 1);
        let token = issuer
            .issue_token(Identity::new(Uuid::now_v7(), Role::Volunteer))
            .unwrap();

        let err = verifier.verify_token(&token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // well past the default 60s leeway
        let provider = JwtAuthProvider::new("test-secret", -2);
        let token = provider
            .issue_token(Identity::new(Uuid::now_v7(), Role::Volunteer))
            .unwrap();
        assert!(provider.verify_token(&token).is_err());
    }
}
