mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::TestApp;
use uuid::Uuid;

#[tokio::test]
async fn beach_cleanup_end_to_end() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;

    // apply -> pending, organization notified
    let (status, application) = app
        .post(&format!("/api/opportunities/{opportunity}/apply"), &volunteer.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], "pending");
    assert_eq!(application["completed"], false);
    let id = application["id"].as_str().unwrap().to_string();

    let (_, inbox) = app.get("/api/opportunities/notifications", &org.token).await;
    assert_eq!(inbox[0]["message"], "A volunteer applied to your opportunity.");
    assert_eq!(inbox[0]["is_read"], false);

    // approve -> volunteer notified
    let (status, approved) = app
        .patch(
            &format!("/api/opportunities/applications/{id}/status"),
            &org.token,
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (_, inbox) = app.get("/api/opportunities/notifications", &volunteer.token).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["message"], "Your application was approved.");

    // complete -> +1 on the ledger
    let (status, body) = app
        .patch(
            &format!("/api/opportunities/applications/{id}/complete"),
            &org.token,
            json!({ "completed": true, "feedback": "great job" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Performance recorded" }));

    let (status, view) = app.get(&format!("/api/opportunities/applications/{id}"), &volunteer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["completed"], true);
    assert_eq!(view["feedback"], "great job");
    assert!(view["completed_at"].is_string());
    assert_eq!(view["opportunity"]["title"], "Beach Cleanup");

    let (_, total) = app
        .request(
            Method::GET,
            &format!("/api/opportunities/volunteer/{}/rating", volunteer.id),
            None,
            None,
        )
        .await;
    assert_eq!(total, json!({ "rating": 1 }));
}

#[tokio::test]
async fn second_application_is_rejected() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;
    app.apply(&volunteer, opportunity).await;

    let (status, body) = app
        .post(&format!("/api/opportunities/{opportunity}/apply"), &volunteer.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already applied");

    let (_, mine) = app.get("/api/opportunities/my/applications", &volunteer.token).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn applying_to_a_missing_opportunity_is_not_found() {
    let app = TestApp::new();
    let volunteer = app.volunteer("Sam").await;

    let (status, body) = app
        .post(&format!("/api/opportunities/{}/apply", Uuid::now_v7()), &volunteer.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_role_is_forbidden_and_mutates_nothing() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;

    let (status, _) = app
        .post(&format!("/api/opportunities/{opportunity}/apply"), &org.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = app.apply(&volunteer, opportunity).await;
    let (status, _) = app
        .patch(
            &format!("/api/opportunities/applications/{id}/status"),
            &volunteer.token,
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, view) = app.get(&format!("/api/opportunities/applications/{id}"), &volunteer.token).await;
    assert_eq!(view["status"], "pending");
    let (_, inbox) = app.get("/api/opportunities/notifications", &volunteer.token).await;
    assert!(inbox.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn another_organization_cannot_decide() {
    let app = TestApp::new();
    let owner = app.organization("Shoreline").await;
    let rival = app.organization("Harbour").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&owner, "Beach Cleanup").await;
    let id = app.apply(&volunteer, opportunity).await;

    let (status, _) = app
        .patch(
            &format!("/api/opportunities/applications/{id}/status"),
            &rival.token,
            json!({ "status": "rejected" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/api/opportunities/applications/{id}"), &rival.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn decisions_are_final() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;
    let id = app.apply(&volunteer, opportunity).await;
    let path = format!("/api/opportunities/applications/{id}/status");

    let (status, _) = app.patch(&path, &org.token, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.patch(&path, &org.token, json!({ "status": "rejected" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (status, _) = app.patch(&path, &org.token, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&path, &org.token, json!({ "status": "maybe" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completion_requires_approval_and_feedback() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;
    let id = app.apply(&volunteer, opportunity).await;
    let path = format!("/api/opportunities/applications/{id}/complete");

    let (status, body) = app
        .patch(&path, &org.token, json!({ "completed": true, "feedback": "great" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Application not approved");

    app.approve(&org, id).await;
    let (status, body) = app.patch(&path, &org.token, json!({ "completed": true })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feedback required");

    assert_eq!(app.complete(&org, id, true).await, StatusCode::OK);
    // once only
    assert_eq!(app.complete(&org, id, true).await, StatusCode::BAD_REQUEST);

    let (_, total) = app
        .request(Method::GET, &format!("/api/opportunities/volunteer/{}/rating", volunteer.id), None, None)
        .await;
    assert_eq!(total["rating"], 1);
}

#[tokio::test]
async fn no_show_costs_a_point() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;
    let id = app.apply(&volunteer, opportunity).await;
    app.approve(&org, id).await;

    assert_eq!(app.complete(&org, id, false).await, StatusCode::OK);

    let (_, total) = app
        .request(Method::GET, &format!("/api/opportunities/volunteer/{}/rating", volunteer.id), None, None)
        .await;
    assert_eq!(total["rating"], -1);
}

#[tokio::test]
async fn rating_requires_a_completed_engagement() {
    let app = TestApp::new();
    let org = app.organization("Shoreline").await;
    let volunteer = app.volunteer("Sam").await;
    let opportunity = app.post_opportunity(&org, "Beach Cleanup").await;
    let id = app.apply(&volunteer, opportunity).await;
    app.approve(&org, id).await;
    let path = format!("/api/opportunities/applications/{id}/rate");

    let (status, body) = app.post(&path, &org.token, json!({ "rating": 5, "feedback": "early" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event not completed yet");

    assert_eq!(app.complete(&org, id, true).await, StatusCode::OK);
    let (status, rating) = app.post(&path, &org.token, json!({ "rating": 5, "feedback": "superb" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["rating"], 5);
    assert_eq!(rating["volunteer_id"], volunteer.id.to_string());

    // +1 from completion, +5 from the explicit rating
    let (_, total) = app
        .request(Method::GET, &format!("/api/opportunities/volunteer/{}/rating", volunteer.id), None, None)
        .await;
    assert_eq!(total["rating"], 6);
}

#[tokio::test]
async fn organization_listing_is_isolated() {
    let app = TestApp::new();
    let shoreline = app.organization("Shoreline").await;
    let harbour = app.organization("Harbour").await;
    let volunteer = app.volunteer("Sam").await;

    let beach = app.post_opportunity(&shoreline, "Beach Cleanup").await;
    let dock = app.post_opportunity(&harbour, "Dock Painting").await;
    app.apply(&volunteer, beach).await;
    app.apply(&volunteer, dock).await;

    let (status, listed) = app.get("/api/opportunities/org/applications", &shoreline.token).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["opportunity"]["title"], "Beach Cleanup");
    assert_eq!(listed[0]["volunteer"]["name"], "Sam");

    let (_, mine) = app.get("/api/opportunities/my/applications", &volunteer.token).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/opportunities/org/applications", &volunteer.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/opportunities/my/applications", &shoreline.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
