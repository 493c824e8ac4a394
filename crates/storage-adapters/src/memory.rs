//! # In-memory store
//!
//! A dashmap-backed implementation of every repository port. Used for local
//! development without a database and as the backing store of the HTTP tests.
//!
//! Uniqueness (emails, volunteer/opportunity pairs) is claimed through the
//! map's entry API, so the check and the insert happen under one shard lock.
//! Decisions and completions re-check the stored state under the entry's
//! write guard in the same way.

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Application, ApplicationRepo, ApplicationStatus, ApplicationView, Credentials, DomainError,
    Message, MessageRepo, Notification, NotificationRepo, Opportunity, OpportunityRepo,
    ProfileUpdate, Rating, RatingRepo, Result, User, UserRepo,
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, Credentials>,
    emails: DashMap<String, Uuid>,
    opportunities: DashMap<Uuid, Opportunity>,
    applications: DashMap<Uuid, Application>,
    /// (volunteer_id, opportunity_id) -> application id
    pairs: DashMap<(Uuid, Uuid), Uuid>,
    ratings: DashMap<Uuid, Rating>,
    notifications: DashMap<Uuid, Notification>,
    messages: DashMap<Uuid, Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn view(&self, application: Application, with_volunteer: bool) -> Option<ApplicationView> {
        let opportunity = self.opportunities.get(&application.opportunity_id)?.clone();
        let volunteer = if with_volunteer {
            self.users.get(&application.volunteer_id).map(|c| c.user.clone())
        } else {
            None
        };
        Some(ApplicationView { application, opportunity, volunteer })
    }

    fn owned_by(&self, application: &Application, organization_id: Uuid) -> bool {
        self.opportunities
            .get(&application.opportunity_id)
            .is_some_and(|o| o.organization_id == organization_id)
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by_key(|item| Reverse(key(item)));
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: User, password_hash: String) -> Result<User> {
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(DomainError::Conflict("email already registered".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(
                    user.id,
                    Credentials { user: user.clone(), password_hash },
                );
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|c| c.user.clone()))
    }

    async fn get_credentials(&self, email: String) -> Result<Option<Credentials>> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|c| c.clone()))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut c| {
            c.user.skills = update.skills;
            c.user.availability = update.availability;
            c.user.clone()
        }))
    }
}

#[async_trait]
impl OpportunityRepo for MemoryStore {
    async fn create_opportunity(&self, opportunity: Opportunity) -> Result<()> {
        self.opportunities.insert(opportunity.id, opportunity);
        Ok(())
    }

    async fn get_opportunity(&self, id: Uuid) -> Result<Option<Opportunity>> {
        Ok(self.opportunities.get(&id).map(|o| o.clone()))
    }

    async fn list_opportunities(&self) -> Result<Vec<Opportunity>> {
        let mut all: Vec<Opportunity> = self.opportunities.iter().map(|o| o.clone()).collect();
        newest_first(&mut all, |o| (o.created_at, o.id));
        Ok(all)
    }

    async fn count_by_organization(&self, organization_id: Uuid) -> Result<u64> {
        Ok(self
            .opportunities
            .iter()
            .filter(|o| o.organization_id == organization_id)
            .count() as u64)
    }
}

#[async_trait]
impl ApplicationRepo for MemoryStore {
    async fn insert_application(&self, application: Application) -> Result<()> {
        match self.pairs.entry((application.volunteer_id, application.opportunity_id)) {
            Entry::Occupied(_) => Err(DomainError::Conflict("Already applied".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(application.id);
                self.applications.insert(application.id, application);
                Ok(())
            }
        }
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn decide_application(&self, application: Application) -> Result<()> {
        let mut stored = self
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| DomainError::not_found("Application", application.id))?;
        if stored.status != ApplicationStatus::Pending {
            return Err(DomainError::PreconditionFailed(format!(
                "application already {}",
                stored.status
            )));
        }
        stored.status = application.status;
        Ok(())
    }

    async fn complete_application(&self, application: Application, rating: Rating) -> Result<()> {
        let mut stored = self
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| DomainError::not_found("Application", application.id))?;
        if stored.status != ApplicationStatus::Approved {
            return Err(DomainError::PreconditionFailed("Application not approved".to_string()));
        }
        if stored.completed_at.is_some() {
            return Err(DomainError::PreconditionFailed(
                "completion already recorded".to_string(),
            ));
        }
        stored.completed = application.completed;
        stored.completed_at = application.completed_at;
        stored.feedback = application.feedback;
        // still under the application's guard
        self.ratings.insert(rating.id, rating);
        Ok(())
    }

    async fn list_by_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<ApplicationView>> {
        let mine: Vec<Application> = self
            .applications
            .iter()
            .filter(|a| a.volunteer_id == volunteer_id)
            .map(|a| a.clone())
            .collect();
        let mut views: Vec<ApplicationView> =
            mine.into_iter().filter_map(|a| self.view(a, false)).collect();
        newest_first(&mut views, |v| (v.application.created_at, v.application.id));
        Ok(views)
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<ApplicationView>> {
        let theirs: Vec<Application> = self
            .applications
            .iter()
            .filter(|a| self.owned_by(a, organization_id))
            .map(|a| a.clone())
            .collect();
        let mut views: Vec<ApplicationView> =
            theirs.into_iter().filter_map(|a| self.view(a, true)).collect();
        newest_first(&mut views, |v| (v.application.created_at, v.application.id));
        Ok(views)
    }

    async fn count_by_volunteer(&self, volunteer_id: Uuid) -> Result<u64> {
        Ok(self
            .applications
            .iter()
            .filter(|a| a.volunteer_id == volunteer_id)
            .count() as u64)
    }

    async fn count_completed_by_organization(&self, organization_id: Uuid) -> Result<u64> {
        Ok(self
            .applications
            .iter()
            .filter(|a| a.completed && self.owned_by(a, organization_id))
            .count() as u64)
    }

    async fn completion_dates(&self, volunteer_id: Uuid) -> Result<Vec<DateTime<Utc>>> {
        Ok(self
            .applications
            .iter()
            .filter(|a| a.volunteer_id == volunteer_id && a.completed)
            .filter_map(|a| a.completed_at)
            .collect())
    }
}

#[async_trait]
impl RatingRepo for MemoryStore {
    async fn append_rating(&self, rating: Rating) -> Result<()> {
        self.ratings.insert(rating.id, rating);
        Ok(())
    }

    async fn ratings_for_volunteer(&self, volunteer_id: Uuid) -> Result<Vec<i32>> {
        Ok(self
            .ratings
            .iter()
            .filter(|r| r.volunteer_id == volunteer_id)
            .map(|r| r.rating)
            .collect())
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert_notification(&self, notification: Notification) -> Result<()> {
        self.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut inbox: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.clone())
            .collect();
        newest_first(&mut inbox, |n| (n.created_at, n.id));
        Ok(inbox)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MessageRepo for MemoryStore {
    async fn insert_message(&self, message: Message) -> Result<()> {
        self.messages.insert(message.id, message);
        Ok(())
    }

    async fn conversation(&self, user_id: Uuid, peer_id: Uuid) -> Result<Vec<Message>> {
        let mut thread: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == peer_id)
                    || (m.sender_id == peer_id && m.receiver_id == user_id)
            })
            .map(|m| m.clone())
            .collect();
        thread.sort_by_key(|m| (m.created_at, m.id));
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::Role;

    fn user(role: Role, email: &str) -> User {
        User {
            id: Uuid::now_v7(),
            name: "Test".into(),
            email: email.into(),
            role,
            skills: None,
            availability: None,
            created_at: Utc::now(),
        }
    }

    fn opportunity(organization_id: Uuid) -> Opportunity {
        Opportunity {
            id: Uuid::now_v7(),
            organization_id,
            title: "Tree Planting".into(),
            description: "Spades provided".into(),
            location: "North Park".into(),
            date: "2025-04-12".into(),
            created_at: Utc::now(),
        }
    }

    fn application(volunteer_id: Uuid, opportunity_id: Uuid) -> Application {
        Application {
            id: Uuid::now_v7(),
            opportunity_id,
            volunteer_id,
            status: ApplicationStatus::Pending,
            completed: false,
            completed_at: None,
            feedback: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(user(Role::Volunteer, "a@x.org"), "h".into()).await.unwrap();
        let err = store
            .create_user(user(Role::Organization, "A@x.org"), "h".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn second_application_for_pair_conflicts() {
        let store = MemoryStore::new();
        let org = Uuid::now_v7();
        let volunteer = Uuid::now_v7();
        let opp = opportunity(org);
        store.create_opportunity(opp.clone()).await.unwrap();

        store.insert_application(application(volunteer, opp.id)).await.unwrap();
        let err = store.insert_application(application(volunteer, opp.id)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.count_by_volunteer(volunteer).await.unwrap(), 1);
    }

    fn rating_for(application: &Application) -> Rating {
        Rating {
            id: Uuid::now_v7(),
            application_id: application.id,
            volunteer_id: application.volunteer_id,
            organization_id: Uuid::now_v7(),
            rating: 1,
            feedback: "great job".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn only_a_pending_application_can_be_decided() {
        let store = MemoryStore::new();
        let pending = application(Uuid::now_v7(), Uuid::now_v7());
        store.insert_application(pending.clone()).await.unwrap();

        let approved = Application { status: ApplicationStatus::Approved, ..pending.clone() };
        let rejected = Application { status: ApplicationStatus::Rejected, ..pending.clone() };
        store.decide_application(approved).await.unwrap();
        let err = store.decide_application(rejected).await.unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed(_)));
        let stored = store.get_application(pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Approved);
    }

    #[tokio::test]
    async fn completion_is_written_once_with_one_rating() {
        let store = MemoryStore::new();
        let mut app = application(Uuid::now_v7(), Uuid::now_v7());
        app.status = ApplicationStatus::Approved;
        store.insert_application(app.clone()).await.unwrap();

        let done = Application {
            completed: true,
            completed_at: Some(Utc::now()),
            feedback: Some("great job".into()),
            ..app.clone()
        };
        store.complete_application(done.clone(), rating_for(&app)).await.unwrap();
        let err = store.complete_application(done, rating_for(&app)).await.unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed(_)));
        assert_eq!(store.ratings_for_volunteer(app.volunteer_id).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn pending_application_cannot_be_completed() {
        let store = MemoryStore::new();
        let app = application(Uuid::now_v7(), Uuid::now_v7());
        store.insert_application(app.clone()).await.unwrap();

        let done = Application { completed: true, completed_at: Some(Utc::now()), ..app.clone() };
        let err = store.complete_application(done, rating_for(&app)).await.unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed(_)));
        assert!(store.ratings_for_volunteer(app.volunteer_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn organization_listing_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let org_a = user(Role::Organization, "a@org.org");
        let org_b = user(Role::Organization, "b@org.org");
        let volunteer = user(Role::Volunteer, "v@x.org");
        for u in [&org_a, &org_b, &volunteer] {
            store.create_user(u.clone(), "h".into()).await.unwrap();
        }
        let opp_a = opportunity(org_a.id);
        let opp_b = opportunity(org_b.id);
        store.create_opportunity(opp_a.clone()).await.unwrap();
        store.create_opportunity(opp_b.clone()).await.unwrap();
        store.insert_application(application(volunteer.id, opp_a.id)).await.unwrap();
        store.insert_application(application(volunteer.id, opp_b.id)).await.unwrap();

        let listed = store.list_by_organization(org_a.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].opportunity.id, opp_a.id);
        assert_eq!(listed[0].volunteer.as_ref().map(|u| u.id), Some(volunteer.id));
    }

    #[tokio::test]
    async fn mark_read_is_idempotent_and_owner_scoped() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let n = Notification::new(owner, "hello");
        store.insert_notification(n.clone()).await.unwrap();

        assert!(store.mark_read(n.id, owner).await.unwrap());
        assert!(store.mark_read(n.id, owner).await.unwrap());
        assert!(!store.mark_read(n.id, Uuid::now_v7()).await.unwrap());
        assert!(store.list_for_user(owner).await.unwrap()[0].is_read);
    }

    #[tokio::test]
    async fn conversation_includes_both_directions() {
        let store = MemoryStore::new();
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        for (from, to) in [(a, b), (b, a), (a, c)] {
            store
                .insert_message(Message {
                    id: Uuid::now_v7(),
                    sender_id: from,
                    receiver_id: to,
                    content: "hi".into(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let thread = store.conversation(a, b).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].sender_id, a);
    }
}
