//! Orchestrates the application workflow: loads records, runs the pure
//! transition from [`domains::workflow`], writes the result, then fans out
//! notifications.

use std::sync::Arc;

use chrono::Utc;
use domains::workflow::{self, require_role};
use domains::{
    Application, ApplicationRepo, ApplicationStatus, ApplicationView, DomainError, Identity,
    Opportunity, OpportunityRepo, Rating, RatingRepo, Result, Role,
};
use uuid::Uuid;

use crate::notification::NotificationService;

#[derive(Clone)]
pub struct ApplicationService {
    opportunities: Arc<dyn OpportunityRepo>,
    applications: Arc<dyn ApplicationRepo>,
    ratings: Arc<dyn RatingRepo>,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(
        opportunities: Arc<dyn OpportunityRepo>,
        applications: Arc<dyn ApplicationRepo>,
        ratings: Arc<dyn RatingRepo>,
        notifications: NotificationService,
    ) -> Self {
        Self { opportunities, applications, ratings, notifications }
    }

    pub async fn apply(&self, caller: &Identity, opportunity_id: Uuid) -> Result<Application> {
        require_role(caller, Role::Volunteer)?;
        let opportunity = self.load_opportunity(opportunity_id).await?;

        let transition = workflow::apply(caller, &opportunity, Utc::now())?;
        self.applications.insert_application(transition.record.clone()).await?;
        tracing::info!(
            application_id = %transition.record.id,
            %opportunity_id,
            volunteer_id = %caller.user_id,
            "application submitted"
        );

        self.notifications.dispatch(transition.notifications).await;
        Ok(transition.record)
    }

    pub async fn set_status(
        &self,
        caller: &Identity,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        require_role(caller, Role::Organization)?;
        let (application, opportunity) = self.load(application_id).await?;

        let transition = workflow::set_status(caller, application, &opportunity, status)?;
        self.applications.decide_application(transition.record.clone()).await?;
        tracing::info!(%application_id, %status, "application status changed");

        self.notifications.dispatch(transition.notifications).await;
        Ok(transition.record)
    }

    /// Records the outcome of an approved engagement and its automatic +1/-1 rating.
    pub async fn mark_complete(
        &self,
        caller: &Identity,
        application_id: Uuid,
        completed: bool,
        feedback: &str,
    ) -> Result<Application> {
        require_role(caller, Role::Organization)?;
        let (application, opportunity) = self.load(application_id).await?;

        let completion =
            workflow::complete(caller, application, &opportunity, completed, feedback, Utc::now())?;
        self.applications
            .complete_application(completion.application.clone(), completion.rating)
            .await?;
        tracing::info!(%application_id, completed, "performance recorded");

        Ok(completion.application)
    }

    /// Appends an additional rating for a completed engagement.
    pub async fn rate(
        &self,
        caller: &Identity,
        application_id: Uuid,
        value: i32,
        feedback: String,
    ) -> Result<Rating> {
        require_role(caller, Role::Organization)?;
        let (application, opportunity) = self.load(application_id).await?;

        let rating = workflow::rate(caller, &application, &opportunity, value, feedback, Utc::now())?;
        self.ratings.append_rating(rating.clone()).await?;
        Ok(rating)
    }

    /// Visible to the applicant and to the organization that owns the opportunity.
    pub async fn get(&self, caller: &Identity, application_id: Uuid) -> Result<ApplicationView> {
        let (application, opportunity) = self.load(application_id).await?;
        if application.volunteer_id != caller.user_id && opportunity.organization_id != caller.user_id {
            return Err(DomainError::Forbidden(
                "application belongs to someone else".to_string(),
            ));
        }
        Ok(ApplicationView { application, opportunity, volunteer: None })
    }

    pub async fn list_mine(&self, caller: &Identity) -> Result<Vec<ApplicationView>> {
        require_role(caller, Role::Volunteer)?;
        self.applications.list_by_volunteer(caller.user_id).await
    }

    pub async fn list_for_organization(&self, caller: &Identity) -> Result<Vec<ApplicationView>> {
        require_role(caller, Role::Organization)?;
        self.applications.list_by_organization(caller.user_id).await
    }

    pub async fn stats_for_volunteer(&self, volunteer_id: Uuid) -> Result<u64> {
        self.applications.count_by_volunteer(volunteer_id).await
    }

    async fn load_opportunity(&self, id: Uuid) -> Result<Opportunity> {
        self.opportunities
            .get_opportunity(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Opportunity", id))
    }

    async fn load(&self, application_id: Uuid) -> Result<(Application, Opportunity)> {
        let application = self
            .applications
            .get_application(application_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Application", application_id))?;
        let opportunity = self.load_opportunity(application.opportunity_id).await?;
        Ok((application, opportunity))
    }
}
