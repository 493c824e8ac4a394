use std::sync::Arc;

use domains::reputation::{monthly_streak, total_rating, RatingSummary};
use domains::{ApplicationRepo, RatingRepo, Result};
use uuid::Uuid;

/// Read-side aggregates over ratings and completions.
#[derive(Clone)]
pub struct ReputationService {
    ratings: Arc<dyn RatingRepo>,
    applications: Arc<dyn ApplicationRepo>,
}

impl ReputationService {
    pub fn new(ratings: Arc<dyn RatingRepo>, applications: Arc<dyn ApplicationRepo>) -> Self {
        Self { ratings, applications }
    }

    pub async fn total_rating(&self, volunteer_id: Uuid) -> Result<i64> {
        let values = self.ratings.ratings_for_volunteer(volunteer_id).await?;
        Ok(total_rating(&values))
    }

    pub async fn average_rating(&self, volunteer_id: Uuid) -> Result<RatingSummary> {
        let values = self.ratings.ratings_for_volunteer(volunteer_id).await?;
        Ok(RatingSummary::from_values(&values))
    }

    pub async fn monthly_streak(&self, volunteer_id: Uuid) -> Result<u32> {
        let dates = self.applications.completion_dates(volunteer_id).await?;
        Ok(monthly_streak(&dates))
    }
}
