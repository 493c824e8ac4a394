use std::sync::Arc;

use chrono::Utc;
use domains::{AuthProvider, DomainError, Identity, ProfileUpdate, Result, Role, User, UserRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A signed bearer token and the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Registration, login and self-service profile.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { users, auth }
    }

    pub async fn register(&self, input: Registration) -> Result<Session> {
        let name = input.name.trim();
        let email = normalize_email(&input.email);
        if name.is_empty() || email.is_empty() {
            return Err(DomainError::ValidationError("name and email are required".to_string()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::ValidationError(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.auth.hash_password(&input.password)?;
        let user = User {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email,
            role: input.role,
            skills: None,
            availability: None,
            created_at: Utc::now(),
        };
        let user = self.users.create_user(user, password_hash).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "account registered");

        self.session_for(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let rejected = || DomainError::Unauthorized("invalid email or password".to_string());

        let credentials = self
            .users
            .get_credentials(normalize_email(email))
            .await?
            .ok_or_else(rejected)?;
        if !self.auth.verify_password(password, &credentials.password_hash) {
            tracing::debug!(user_id = %credentials.user.id, "password mismatch");
            return Err(rejected());
        }

        self.session_for(credentials.user)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        self.users
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    /// Resolves a bearer token to the caller it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<Identity> {
        self.auth.verify_token(token)
    }

    fn session_for(&self, user: User) -> Result<Session> {
        let token = self.auth.issue_token(Identity::new(user.id, user.role))?;
        Ok(Session { token, user })
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
