use std::sync::Arc;

use domains::{DomainError, Notification, NotificationRepo, Result};
use uuid::Uuid;

/// Notification fan-out and the per-user inbox.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepo>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepo>) -> Self {
        Self { repo }
    }

    pub async fn notify(&self, user_id: Uuid, message: impl Into<String>) -> Result<Notification> {
        let notification = Notification::new(user_id, message);
        self.repo.insert_notification(notification.clone()).await?;
        Ok(notification)
    }

    /// Best-effort delivery of notifications produced by a transition.
    ///
    /// Runs after the primary write has committed; failures are logged and
    /// the primary change stands.
    pub async fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            let user_id = notification.user_id;
            if let Err(err) = self.repo.insert_notification(notification).await {
                tracing::warn!(%user_id, error = %err, "failed to store notification");
            }
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.repo.list_for_user(user_id).await
    }

    /// Idempotent: marking an already-read notification succeeds.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        if self.repo.mark_read(id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Notification", id))
        }
    }
}
