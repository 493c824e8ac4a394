//! In-process HTTP harness: the full router over a fresh in-memory store,
//! driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use api_adapters::{router, AppState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    router: Router,
}

/// A registered account as seen by a client.
pub struct Account {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let (services, _store) = integration_tests::memory_services();
        Self { router: router(AppState::new(services)) }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> Account {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "correct-horse", "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        Account {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn organization(&self, name: &str) -> Account {
        let email = format!("{}@org.test", name.to_lowercase().replace(' ', "-"));
        self.register(name, &email, "organization").await
    }

    pub async fn volunteer(&self, name: &str) -> Account {
        let email = format!("{}@volunteer.test", name.to_lowercase().replace(' ', "-"));
        self.register(name, &email, "volunteer").await
    }

    /// Posts an opportunity and returns its id.
    pub async fn post_opportunity(&self, organization: &Account, title: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/opportunities",
                &organization.token,
                json!({ "title": title, "description": "Bring gloves", "location": "Pier 4", "date": "2025-06-01" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create opportunity: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Applies and returns the application id.
    pub async fn apply(&self, volunteer: &Account, opportunity_id: Uuid) -> Uuid {
        let (status, body) = self
            .post(&format!("/api/opportunities/{opportunity_id}/apply"), &volunteer.token, json!({}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "apply: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn approve(&self, organization: &Account, application_id: Uuid) {
        let (status, body) = self
            .patch(
                &format!("/api/opportunities/applications/{application_id}/status"),
                &organization.token,
                json!({ "status": "approved" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve: {body}");
    }

    pub async fn complete(&self, organization: &Account, application_id: Uuid, completed: bool) -> StatusCode {
        self.patch(
            &format!("/api/opportunities/applications/{application_id}/complete"),
            &organization.token,
            json!({ "completed": completed, "feedback": "Arrived on time" }),
        )
        .await
        .0
    }
}
