//! # Core Traits (Ports)
//!
//! Any storage or auth adapter must implement these traits to be wired into
//! the services. Handles are injected as `Arc<dyn Trait>`, never global.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Application, ApplicationView, Credentials, Identity, Message, Notification, Opportunity,
    ProfileUpdate, Rating, User,
};

/// Account persistence.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the email (case-insensitive) is taken.
    async fn create_user(&self, user: User, password_hash: String) -> Result<User>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_credentials(&self, email: String) -> Result<Option<Credentials>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>>;
}

/// Opportunity registry persistence.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait OpportunityRepo: Send + Sync {
    async fn create_opportunity(&self, opportunity: Opportunity) -> Result<()>;
    async fn get_opportunity(&self, id: Uuid) -> Result<Option<Opportunity>>;
    /// Newest first.
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>>;
    async fn count_by_organization(&self, organization_id: Uuid) -> Result<u64>;
}

/// Application workflow persistence.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    /// Single constrained insert: fails with `Conflict` when the
    /// (volunteer, opportunity) pair already has an application.
    async fn insert_application(&self, application: Application) -> Result<()>;
    async fn get_application(&self, id: Uuid) -> Result<Option<Application>>;
    /// Stores the decision on an application. Conditional on the stored row
    /// still being `pending`; a decision that lost a race fails with
    /// `PreconditionFailed` and writes nothing.
    async fn decide_application(&self, application: Application) -> Result<()>;

    /// Stores the completed application and its rating together. Conditional
    /// on the stored row being `approved` with no completion recorded;
    /// otherwise `PreconditionFailed` and neither is written.
    async fn complete_application(&self, application: Application, rating: Rating) -> Result<()>;

    async fn list_by_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<ApplicationView>>;
    /// Joined on `opportunity.organization_id`; newest first, volunteer embedded.
    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<ApplicationView>>;
    async fn count_by_volunteer(&self, volunteer_id: Uuid) -> Result<u64>;
    async fn count_completed_by_organization(&self, organization_id: Uuid) -> Result<u64>;
    /// Completion timestamps of the volunteer's applications with `completed = true`.
    async fn completion_dates(&self, volunteer_id: Uuid) -> Result<Vec<DateTime<Utc>>>;
}

/// Append-only rating ledger.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RatingRepo: Send + Sync {
    async fn append_rating(&self, rating: Rating) -> Result<()>;
    async fn ratings_for_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<i32>>;
}

/// Per-user notification inbox.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert_notification(&self, notification: Notification) -> Result<()>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;
    /// Returns `false` when the user owns no notification with this id.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// Direct message history.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert_message(&self, message: Message) -> Result<()>;
    /// Messages exchanged in either direction, oldest first.
    async fn conversation(&self, user_id: Uuid, peer_id: Uuid) -> Result<Vec<Message>>;
}

/// Identity contract: password hashing and bearer tokens.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored PHC hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    fn issue_token(&self, identity: Identity) -> Result<String>;

    /// Fails with `Unauthorized` for expired, malformed or forged tokens.
    fn verify_token(&self, token: &str) -> Result<Identity>;
}
