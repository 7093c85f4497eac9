// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes acting on the signed-in user.

use super::{ok, ApiOk, LocaleQuery};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Gender, Relative, User};
use crate::services::{OwnedFamily, Registration, RepairReport, SessionProfile};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", post(start_session))
        .route("/api/me", get(get_me))
        .route("/api/me/family", get(get_my_family))
        .route("/api/me/relatives", get(get_my_relatives))
        .route("/api/me/relations/repair", post(repair_my_relations))
}

/// Profile fields sent by the frontend right after the auth provider signs
/// the user in.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub display_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub photo_url: Option<String>,
    pub gender: Option<Gender>,
}

/// Create or refresh the caller's profile and ensure their family exists.
async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<ApiOk<Registration>>> {
    body.validate()?;

    let profile = SessionProfile {
        display_name: body.display_name.trim().to_string(),
        email: body.email,
        photo_url: body.photo_url,
        gender: body.gender,
    };

    let registration = state.onboarding.register(&user.user_id, profile).await?;
    Ok(ok(registration))
}

#[derive(Serialize)]
pub struct UserBody {
    pub user: User,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiOk<UserBody>>> {
    let profile = state.families.get_user_by_id(&user.user_id).await?;
    Ok(ok(UserBody { user: profile }))
}

/// The caller's own family, created on demand.
async fn get_my_family(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiOk<OwnedFamily>>> {
    let owned = state.onboarding.ensure_family(&user.user_id).await?;
    Ok(ok(owned))
}

#[derive(Serialize)]
pub struct RelativesResponse {
    pub relatives: Vec<Relative>,
}

async fn get_my_relatives(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiOk<RelativesResponse>>> {
    let locale = query.resolve(state.config.default_locale)?;
    let relatives = state
        .resolver
        .get_family_by_user_id(&user.user_id, locale)
        .await?;
    Ok(ok(RelativesResponse { relatives }))
}

#[derive(Serialize)]
pub struct RepairResponse {
    pub report: RepairReport,
}

/// Re-run bidirectional synthesis for the caller.
async fn repair_my_relations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiOk<RepairResponse>>> {
    tracing::info!(user_id = %user.user_id, "Relation repair requested");
    let report = state
        .resolver
        .setup_bidirectional_relations(&user.user_id)
        .await?;
    Ok(ok(RepairResponse { report }))
}
