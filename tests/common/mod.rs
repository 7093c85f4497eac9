// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use church_family::config::Config;
use church_family::db::{FirestoreDb, MemoryStore};
use church_family::middleware::auth::create_jwt;
use church_family::models::{Gender, Role, User};
use church_family::routes::create_router;
use church_family::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store (for seeding and
/// failure injection).
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(
    config: Config,
) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config, store.clone()));
    (create_router(state.clone()), state, store)
}

/// Signed session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> String {
    create_jwt(user_id, role, signing_key).expect("Failed to sign test token")
}

/// Send one request as `user_id` and decode the JSON body.
#[allow(dead_code)]
pub async fn call(
    app: &axum::Router,
    state: &AppState,
    user_id: &str,
    role: Role,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let token = create_test_jwt(user_id, role, &state.config.jwt_signing_key);
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Start a session for `user_id` (creates the profile and own family).
#[allow(dead_code)]
pub async fn sign_in(
    app: &axum::Router,
    state: &AppState,
    user_id: &str,
    name: &str,
    gender: &str,
) -> Value {
    let (status, body) = call(
        app,
        state,
        user_id,
        Role::User,
        "POST",
        "/api/session",
        Some(serde_json::json!({ "displayName": name, "gender": gender })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");
    body
}

/// Insert a profile directly, without a session (so no own family).
#[allow(dead_code)]
pub async fn seed_user(store: &MemoryStore, user_id: &str, name: &str, gender: Gender) {
    use church_family::db::FamilyStore;

    let mut user = User::new(user_id, name, "2026-01-01T00:00:00Z");
    user.gender = gender;
    store.upsert_user(&user).await.unwrap();
}
