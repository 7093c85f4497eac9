// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Tokens are accepted from the session cookie or the Bearer header
//! 3. Admin-only and self-or-admin routes enforce the caller's role
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use church_family::middleware::auth::SESSION_COOKIE;
use church_family::models::Role;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should return 401 Unauthorized without token, in the error envelope
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::AUTHORIZATION, "Bearer invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let (app, _, _) = common::create_test_app();
    let token = common::create_test_jwt("u1", Role::User, b"some_other_key_entirely_32bytes!");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (app, state, _) = common::create_test_app();
    common::sign_in(&app, &state, "u1", "Ana", "female").await;
    let token = common::create_test_jwt("u1", Role::User, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (app, state, _) = common::create_test_app();
    common::sign_in(&app, &state, "u1", "Ana", "female").await;

    let (status, body) =
        common::call(&app, &state, "u1", Role::User, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "forbidden");

    let (status, body) =
        common::call(&app, &state, "root", Role::Admin, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["id"], "u1");

    let (status, _) =
        common::call(&app, &state, "u1", Role::User, "DELETE", "/api/users/u1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_lookup_is_self_or_admin() {
    let (app, state, _) = common::create_test_app();
    common::sign_in(&app, &state, "u1", "Ana", "female").await;
    common::sign_in(&app, &state, "u2", "Beto", "male").await;

    let (status, body) =
        common::call(&app, &state, "u1", Role::User, "GET", "/api/users/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["displayName"], "Ana");

    let (status, _) =
        common::call(&app, &state, "u1", Role::User, "GET", "/api/users/u2/relatives", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::call(
        &app,
        &state,
        "root",
        Role::Admin,
        "GET",
        "/api/users/u2/families",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["families"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/me")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-content-type-options"));
}
