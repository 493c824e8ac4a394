//! # api-adapters Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.
//! Handlers stay thin: extract, call one service, wrap the result.

use axum::extract::State;
use axum::http::StatusCode;
use domains::reputation::RatingSummary;
use domains::{
    Application, ApplicationStatus, ApplicationView, Message, NewOpportunity, Notification,
    Opportunity, ProfileUpdate, Rating, Role, User,
};
use serde::Deserialize;
use serde_json::{json, Value};
use services::{OrganizationStats, Registration, Services, Session};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, AuthUser};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

pub async fn health() -> &'static str {
    "Volunteer Hub API Running"
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<Registration>,
) -> ApiResult<(StatusCode, ApiJson<Session>)> {
    let session = state.services.accounts.register(input).await?;
    Ok((StatusCode::CREATED, ApiJson(session)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<Session>> {
    let session = state.services.accounts.login(&input.email, &input.password).await?;
    Ok(ApiJson(session))
}

pub async fn me(State(state): State<AppState>, AuthUser(caller): AuthUser) -> ApiResult<ApiJson<User>> {
    Ok(ApiJson(state.services.accounts.me(caller.user_id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<ApiJson<User>> {
    let user = state.services.accounts.update_profile(caller.user_id, update).await?;
    Ok(ApiJson(user))
}

// ── Opportunities ────────────────────────────────────────────────────────────

pub async fn create_opportunity(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<NewOpportunity>,
) -> ApiResult<(StatusCode, ApiJson<Opportunity>)> {
    let opportunity = state.services.opportunities.create(&caller, input).await?;
    Ok((StatusCode::CREATED, ApiJson(opportunity)))
}

pub async fn list_opportunities(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Opportunity>>> {
    Ok(ApiJson(state.services.opportunities.list_all().await?))
}

/// Organizations see how many opportunities they posted, volunteers how many
/// applications they submitted.
pub async fn stats(State(state): State<AppState>, AuthUser(caller): AuthUser) -> ApiResult<ApiJson<Value>> {
    let body = match caller.role {
        Role::Organization => {
            let count = state.services.opportunities.stats_for_organization(caller.user_id).await?;
            json!({ "opportunities": count })
        }
        Role::Volunteer => {
            let count = state.services.applications.stats_for_volunteer(caller.user_id).await?;
            json!({ "applications": count })
        }
    };
    Ok(ApiJson(body))
}

pub async fn organization_stats(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<OrganizationStats>> {
    let stats = state
        .services
        .opportunities
        .organization_profile_stats(organization_id)
        .await?;
    Ok(ApiJson(stats))
}

// ── Applications ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completed: bool,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
    #[serde(default)]
    pub feedback: String,
}

pub async fn apply(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(opportunity_id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, ApiJson<Application>)> {
    let application = state.services.applications.apply(&caller, opportunity_id).await?;
    Ok((StatusCode::CREATED, ApiJson(application)))
}

pub async fn my_applications(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<ApiJson<Vec<ApplicationView>>> {
    Ok(ApiJson(state.services.applications.list_mine(&caller).await?))
}

pub async fn organization_applications(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<ApiJson<Vec<ApplicationView>>> {
    Ok(ApiJson(state.services.applications.list_for_organization(&caller).await?))
}

pub async fn get_application(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(application_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<ApplicationView>> {
    Ok(ApiJson(state.services.applications.get(&caller, application_id).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<ApiJson<Application>> {
    let application = state
        .services
        .applications
        .set_status(&caller, application_id, body.status)
        .await?;
    Ok(ApiJson(application))
}

pub async fn mark_complete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CompleteRequest>,
) -> ApiResult<ApiJson<Value>> {
    state
        .services
        .applications
        .mark_complete(&caller, application_id, body.completed, &body.feedback)
        .await?;
    Ok(ApiJson(json!({ "message": "Performance recorded" })))
}

pub async fn rate(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RateRequest>,
) -> ApiResult<ApiJson<Rating>> {
    let rating = state
        .services
        .applications
        .rate(&caller, application_id, body.rating, body.feedback)
        .await?;
    Ok(ApiJson(rating))
}

// ── Reputation ───────────────────────────────────────────────────────────────

pub async fn volunteer_total_rating(
    State(state): State<AppState>,
    ApiPath(volunteer_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<Value>> {
    let total = state.services.reputation.total_rating(volunteer_id).await?;
    Ok(ApiJson(json!({ "rating": total })))
}

pub async fn average_rating(
    State(state): State<AppState>,
    ApiPath(volunteer_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<RatingSummary>> {
    Ok(ApiJson(state.services.reputation.average_rating(volunteer_id).await?))
}

pub async fn streak(
    State(state): State<AppState>,
    ApiPath(volunteer_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<Value>> {
    let streak = state.services.reputation.monthly_streak(volunteer_id).await?;
    Ok(ApiJson(json!({ "streak": streak })))
}

// ── Notifications ────────────────────────────────────────────────────────────

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<ApiJson<Vec<Notification>>> {
    Ok(ApiJson(state.services.notifications.list_for_user(caller.user_id).await?))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<Value>> {
    state
        .services
        .notifications
        .mark_read(notification_id, caller.user_id)
        .await?;
    Ok(ApiJson(json!({ "message": "Notification marked as read" })))
}

// ── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[serde(default)]
    pub content: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, ApiJson<Message>)> {
    let message = state
        .services
        .messages
        .send(caller.user_id, body.receiver_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(message)))
}

pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(peer_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<Vec<Message>>> {
    Ok(ApiJson(state.services.messages.conversation(caller.user_id, peer_id).await?))
}
