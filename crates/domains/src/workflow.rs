//! # Application Workflow
//!
//! Pure state transitions for an [`Application`]:
//!
//! ```text
//! (none) --apply--> pending --approve--> approved --complete(true)--> +1 rating
//!                      |                     |
//!                      +--reject--> rejected +--complete(false)--> -1 rating
//! ```
//!
//! Transitions never touch storage. Each returns the updated record together
//! with the notifications it produces; the caller decides how both are written.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::models::{
    Application, ApplicationStatus, Identity, Notification, Opportunity, Rating, Role,
};

pub const APPLIED_MESSAGE: &str = "A volunteer applied to your opportunity.";

/// The outcome of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub record: T,
    pub notifications: Vec<Notification>,
}

impl<T> Transition<T> {
    fn new(record: T, notifications: Vec<Notification>) -> Self {
        Self { record, notifications }
    }
}

/// A completed application and the automatic rating it earns.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub application: Application,
    pub rating: Rating,
}

pub fn require_role(caller: &Identity, role: Role) -> Result<()> {
    if caller.is(role) {
        return Ok(());
    }
    let message = match role {
        Role::Volunteer => "only volunteers can perform this action",
        Role::Organization => "only organizations can perform this action",
    };
    Err(DomainError::Forbidden(message.to_string()))
}

/// The caller must be the organization that posted the opportunity.
pub fn require_owner(caller: &Identity, opportunity: &Opportunity) -> Result<()> {
    require_role(caller, Role::Organization)?;
    if opportunity.organization_id != caller.user_id {
        return Err(DomainError::Forbidden(
            "opportunity belongs to another organization".to_string(),
        ));
    }
    Ok(())
}

/// A volunteer applies; the posting organization is notified.
pub fn apply(
    caller: &Identity,
    opportunity: &Opportunity,
    now: DateTime<Utc>,
) -> Result<Transition<Application>> {
    require_role(caller, Role::Volunteer)?;

    let application = Application {
        id: Uuid::now_v7(),
        opportunity_id: opportunity.id,
        volunteer_id: caller.user_id,
        status: ApplicationStatus::Pending,
        completed: false,
        completed_at: None,
        feedback: None,
        created_at: now,
    };
    let notice = Notification::new(opportunity.organization_id, APPLIED_MESSAGE);
    Ok(Transition::new(application, vec![notice]))
}

/// Approve or reject a pending application; the volunteer is notified.
///
/// Decisions are final: only `pending` applications move, and only to
/// `approved` or `rejected`.
pub fn set_status(
    caller: &Identity,
    mut application: Application,
    opportunity: &Opportunity,
    status: ApplicationStatus,
) -> Result<Transition<Application>> {
    require_owner(caller, opportunity)?;

    if status == ApplicationStatus::Pending {
        return Err(DomainError::ValidationError(
            "status must be `approved` or `rejected`".to_string(),
        ));
    }
    if application.status != ApplicationStatus::Pending {
        return Err(DomainError::PreconditionFailed(format!(
            "application already {}",
            application.status
        )));
    }

    application.status = status;
    let notice = Notification::new(
        application.volunteer_id,
        format!("Your application was {status}."),
    );
    Ok(Transition::new(application, vec![notice]))
}

/// Record whether an approved volunteer showed up. Earns +1 or -1.
pub fn complete(
    caller: &Identity,
    mut application: Application,
    opportunity: &Opportunity,
    completed: bool,
    feedback: &str,
    now: DateTime<Utc>,
) -> Result<Completion> {
    require_role(caller, Role::Organization)?;
    if feedback.trim().is_empty() {
        return Err(DomainError::ValidationError("Feedback required".to_string()));
    }
    require_owner(caller, opportunity)?;

    if application.status != ApplicationStatus::Approved {
        return Err(DomainError::PreconditionFailed(
            "Application not approved".to_string(),
        ));
    }
    if application.completed_at.is_some() {
        return Err(DomainError::PreconditionFailed(
            "completion already recorded".to_string(),
        ));
    }

    application.completed = completed;
    application.completed_at = Some(now);
    application.feedback = Some(feedback.to_string());

    let rating = Rating {
        id: Uuid::now_v7(),
        application_id: application.id,
        volunteer_id: application.volunteer_id,
        organization_id: caller.user_id,
        rating: if completed { 1 } else { -1 },
        feedback: feedback.to_string(),
        created_at: now,
    };
    Ok(Completion { application, rating })
}

/// An additional rating for a completed engagement, appended to the same ledger.
pub fn rate(
    caller: &Identity,
    application: &Application,
    opportunity: &Opportunity,
    value: i32,
    feedback: String,
    now: DateTime<Utc>,
) -> Result<Rating> {
    require_owner(caller, opportunity)?;
    if !application.completed {
        return Err(DomainError::PreconditionFailed(
            "Event not completed yet".to_string(),
        ));
    }

    Ok(Rating {
        id: Uuid::now_v7(),
        application_id: application.id,
        volunteer_id: application.volunteer_id,
        organization_id: caller.user_id,
        rating: value,
        feedback,
        created_at: now,
    })
}
