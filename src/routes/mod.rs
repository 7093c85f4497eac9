// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod families;
pub mod session;
pub mod users;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{FamilyRole, Locale};
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Success envelope: `{"ok": true, ...payload}`.
#[derive(Serialize)]
pub struct ApiOk<T> {
    ok: bool,
    #[serde(flatten)]
    payload: T,
}

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(payload: T) -> Json<ApiOk<T>> {
    Json(ApiOk { ok: true, payload })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<ApiOk<HealthResponse>> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    ok(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// `?locale=` query parameter shared by listing endpoints.
#[derive(Deserialize, Default)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

impl LocaleQuery {
    /// Requested locale, or the configured default when absent.
    pub fn resolve(&self, default: Locale) -> Result<Locale> {
        match self.locale.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(AppError::BadRequest),
        }
    }
}

// ─── Guards ──────────────────────────────────────────────────

pub(crate) fn require_admin(user: &AuthUser) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator role required".to_string()))
    }
}

pub(crate) fn require_self_or_admin(user: &AuthUser, target_id: &str) -> Result<()> {
    if user.is_admin() || user.user_id == target_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the user or an administrator can access this".to_string(),
        ))
    }
}

/// Any member of the family, or an app admin.
pub(crate) async fn require_family_member(
    state: &AppState,
    user: &AuthUser,
    family_id: &str,
) -> Result<()> {
    // Distinguish a missing family from a forbidden one.
    state.families.get_family(family_id).await?;
    if user.is_admin() {
        return Ok(());
    }
    match state.families.get_member(family_id, &user.user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Forbidden(
            "Not a member of this family".to_string(),
        )),
    }
}

/// The family creator, a member with the family admin role, or an app admin.
pub(crate) async fn require_family_admin(
    state: &AppState,
    user: &AuthUser,
    family_id: &str,
) -> Result<()> {
    let family = state.families.get_family(family_id).await?;
    if user.is_admin() || family.created_by == user.user_id {
        return Ok(());
    }
    match state.families.get_member(family_id, &user.user_id).await? {
        Some(member) if member.role == FamilyRole::Admin => Ok(()),
        _ => Err(AppError::Forbidden(
            "Family administrator role required".to_string(),
        )),
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_check));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(session::routes())
        .merge(families::routes())
        .merge(users::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
