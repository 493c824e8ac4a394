use std::sync::Arc;

use chrono::Utc;
use domains::workflow::require_role;
use domains::{ApplicationRepo, Identity, NewOpportunity, Opportunity, OpportunityRepo, Result, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile figures for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationStats {
    /// Completed engagements across all of the organization's opportunities
    pub rating: u64,
    #[serde(rename = "totalOpportunities")]
    pub total_opportunities: u64,
}

/// Opportunity registry.
#[derive(Clone)]
pub struct OpportunityService {
    opportunities: Arc<dyn OpportunityRepo>,
    applications: Arc<dyn ApplicationRepo>,
}

impl OpportunityService {
    pub fn new(opportunities: Arc<dyn OpportunityRepo>, applications: Arc<dyn ApplicationRepo>) -> Self {
        Self { opportunities, applications }
    }

    /// Publishes an opportunity. Fields are stored as submitted.
    pub async fn create(&self, caller: &Identity, input: NewOpportunity) -> Result<Opportunity> {
        require_role(caller, Role::Organization)?;

        let opportunity = Opportunity {
            id: Uuid::now_v7(),
            organization_id: caller.user_id,
            title: input.title,
            description: input.description,
            location: input.location,
            date: input.date,
            created_at: Utc::now(),
        };
        self.opportunities.create_opportunity(opportunity.clone()).await?;

        tracing::info!(opportunity_id = %opportunity.id, organization_id = %caller.user_id, "opportunity published");
        Ok(opportunity)
    }

    pub async fn list_all(&self) -> Result<Vec<Opportunity>> {
        self.opportunities.list_opportunities().await
    }

    pub async fn stats_for_organization(&self, organization_id: Uuid) -> Result<u64> {
        self.opportunities.count_by_organization(organization_id).await
    }

    pub async fn organization_profile_stats(&self, organization_id: Uuid) -> Result<OrganizationStats> {
        let total_opportunities = self.opportunities.count_by_organization(organization_id).await?;
        let rating = self
            .applications
            .count_completed_by_organization(organization_id)
            .await?;
        Ok(OrganizationStats { rating, total_opportunities })
    }
}
