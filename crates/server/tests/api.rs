use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();

    let engine = engine::Engine::builder().database(db.clone()).build();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn basic_auth() -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("alice:password")
    )
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/wallet?subject_id=kid-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app().await;

    let credentials = base64::engine::general_purpose::STANDARD.encode("alice:nope");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/wallet?subject_id=kid-1")
                .header(header::AUTHORIZATION, format!("Basic {credentials}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn award_is_idempotent_over_http() {
    let app = app().await;

    let payload = json!({
        "subject_id": "kid-1",
        "amount": 50,
        "reason": "daily activity",
        "source_key": "chat-feed#7",
    });

    let response = app
        .clone()
        .oneshot(post_json("/award", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = json_body(response).await;

    let response = app
        .clone()
        .oneshot(post_json("/award", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = json_body(response).await;
    assert_eq!(first["id"], second["id"]);

    let response = app
        .oneshot(get("/entries?subject_id=kid-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["category"], "daily");
    assert_eq!(body["entries"][0]["source"], "canonical");
}

#[tokio::test]
async fn zero_amount_award_maps_to_422() {
    let app = app().await;

    let response = app
        .oneshot(post_json(
            "/award",
            json!({"subject_id": "kid-1", "amount": 0, "reason": "daily activity"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "amount must not be 0");
}

#[tokio::test]
async fn wallet_reflects_awards_and_caps() {
    let app = app().await;

    for (amount, reason) in [(300, "Math Sprint reward"), (300, "Memory Match reward"), (60, "daily activity")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/award",
                json!({"subject_id": "kid-1", "amount": amount, "reason": reason}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(get("/wallet?subject_id=kid-1&tz_offset_minutes=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    // 600 game points today, capped at 500.
    assert_eq!(body["game_points_today"], 500);
    assert_eq!(body["game_excess_today"], 100);
    assert_eq!(body["total_earned"], 560);
    assert_eq!(body["available"], 560);
    assert_eq!(body["per_category"]["games"], 500);
    assert_eq!(body["per_category"]["daily"], 60);
}

#[tokio::test]
async fn redemption_workflow_over_http() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/award",
            json!({"subject_id": "kid-1", "amount": 5000, "reason": "daily activity"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/redemptions",
            json!({"subject_id": "kid-1", "points": 2000, "note": "lego set"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let request = json_body(response).await;
    assert_eq!(request["status"], "requested");
    let id = request["id"].as_str().unwrap().to_string();

    // Accept before approval is an invalid transition.
    let response = app
        .clone()
        .oneshot(post_json(&format!("/redemptions/{id}/accept"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(post_json(&format!("/redemptions/{id}/approve"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "approved");

    let response = app
        .clone()
        .oneshot(post_json(&format!("/redemptions/{id}/accept"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "accepted");

    let response = app
        .clone()
        .oneshot(get("/wallet?subject_id=kid-1"))
        .await
        .unwrap();
    let wallet = json_body(response).await;
    assert_eq!(wallet["total_spent"], 2000);
    assert_eq!(wallet["available"], 3000);
    assert_eq!(wallet["reserved"], 0);

    let response = app
        .clone()
        .oneshot(post_json(&format!("/redemptions/{id}/fulfill"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "fulfilled");

    let response = app
        .oneshot(get("/redemptions?subject_id=kid-1"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["redemptions"].as_array().unwrap().len(), 1);
    assert_eq!(body["redemptions"][0]["status"], "fulfilled");
}

#[tokio::test]
async fn below_minimum_redemption_maps_to_422() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/award",
            json!({"subject_id": "kid-1", "amount": 5000, "reason": "daily activity"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json(
            "/redemptions",
            json!({"subject_id": "kid-1", "points": 1999}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "requested points below minimum");
}

#[tokio::test]
async fn unknown_redemption_maps_to_404() {
    let app = app().await;

    let response = app
        .oneshot(get(&format!(
            "/redemptions/{}",
            uuid::Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usage_counter_over_http() {
    let app = app().await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/usage",
                json!({"subject_id": "kid-1", "action_kind": "image_generation"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(get(
            "/usage/count?subject_id=kid-1&action_kind=image_generation&window=month",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
}
