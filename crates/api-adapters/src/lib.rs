//! # api-adapters
//!
//! The web routing and orchestration layer for Volunteer Hub.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;

#[cfg(feature = "web-axum")]
pub use handlers::AppState;

/// Builds the full JSON API.
///
/// # Developer Note
/// Paths are registered flat rather than nested so that the static segments
/// (`my`, `org`, `applications`, ...) sit beside `{id}` in one table.
#[cfg(feature = "web-axum")]
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::{get, patch, post};
    use handlers::*;

    axum::Router::new()
        .route("/", get(health))
        // Accounts
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/users/me", get(me).put(update_me))
        .route("/api/users/{id}/rating", get(average_rating))
        .route("/api/users/{id}/streak", get(streak))
        // Opportunity registry
        .route("/api/opportunities", post(create_opportunity).get(list_opportunities))
        .route("/api/opportunities/stats", get(stats))
        .route("/api/opportunities/organization/{id}/stats", get(organization_stats))
        // Application workflow
        .route("/api/opportunities/{id}/apply", post(apply))
        .route("/api/opportunities/my/applications", get(my_applications))
        .route("/api/opportunities/org/applications", get(organization_applications))
        .route("/api/opportunities/applications/{id}", get(get_application))
        .route("/api/opportunities/applications/{id}/status", patch(set_status))
        .route("/api/opportunities/applications/{id}/complete", patch(mark_complete))
        .route("/api/opportunities/applications/{id}/rate", post(rate))
        .route("/api/opportunities/volunteer/{id}/rating", get(volunteer_total_rating))
        // Notifications
        .route("/api/opportunities/notifications", get(list_notifications))
        .route("/api/opportunities/notifications/{id}/read", patch(mark_notification_read))
        // Messages
        .route("/api/messages", post(send_message))
        .route("/api/messages/{id}", get(conversation))
        .layer(middleware::propagate_request_id())
        .layer(middleware::trace_layer())
        .layer(middleware::set_request_id())
        .layer(middleware::cors_policy())
        .with_state(state)
}
