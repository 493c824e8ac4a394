//! # services
//!
//! Use cases of Volunteer Hub. Every service receives its ports as injected
//! `Arc<dyn Trait>` handles, so the same code runs against Postgres, the
//! in-memory store, or mocks.

pub mod account;
pub mod application;
pub mod messaging;
pub mod notification;
pub mod opportunity;
pub mod reputation;

use std::sync::Arc;

use domains::{
    ApplicationRepo, AuthProvider, MessageRepo, NotificationRepo, OpportunityRepo, RatingRepo,
    UserRepo,
};

pub use account::{AccountService, Registration, Session};
pub use application::ApplicationService;
pub use messaging::MessageService;
pub use notification::NotificationService;
pub use opportunity::{OpportunityService, OrganizationStats};
pub use reputation::ReputationService;

/// A storage backend that implements every repository port.
pub trait Store:
    UserRepo + OpportunityRepo + ApplicationRepo + RatingRepo + NotificationRepo + MessageRepo
{
}

impl<T> Store for T where
    T: UserRepo + OpportunityRepo + ApplicationRepo + RatingRepo + NotificationRepo + MessageRepo
{
}

/// All services, wired against one store.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub opportunities: OpportunityService,
    pub applications: ApplicationService,
    pub reputation: ReputationService,
    pub notifications: NotificationService,
    pub messages: MessageService,
}

impl Services {
    pub fn new<S: Store + 'static>(store: Arc<S>, auth: Arc<dyn AuthProvider>) -> Self {
        let users: Arc<dyn UserRepo> = store.clone();
        let opportunities: Arc<dyn OpportunityRepo> = store.clone();
        let applications: Arc<dyn ApplicationRepo> = store.clone();
        let ratings: Arc<dyn RatingRepo> = store.clone();
        let notification_repo: Arc<dyn NotificationRepo> = store.clone();
        let message_repo: Arc<dyn MessageRepo> = store;

        let notifications = NotificationService::new(notification_repo);
        Self {
            accounts: AccountService::new(users.clone(), auth),
            opportunities: OpportunityService::new(opportunities.clone(), applications.clone()),
            applications: ApplicationService::new(
                opportunities,
                applications.clone(),
                ratings.clone(),
                notifications.clone(),
            ),
            reputation: ReputationService::new(ratings, applications),
            notifications,
            messages: MessageService::new(message_repo, users),
        }
    }
}
