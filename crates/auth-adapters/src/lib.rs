//! # auth-adapters
//!
//! Argon2-based password hashing and, behind `auth-jwt`, a JWT implementation
//! of `AuthProvider`.

pub mod password;
#[cfg(feature = "auth-jwt")]
pub mod jwt;

use domains::DomainError;
use thiserror::Error;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtAuthProvider;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Token(String),
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        tracing::error!(error = %err, "auth provider failure");
        DomainError::Internal(err.to_string())
    }
}
