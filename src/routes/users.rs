// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory routes (admin listing, per-user lookups).

use super::{ok, require_admin, require_self_or_admin, ApiOk, LocaleQuery};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Family, Relative, User};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{user_id}", get(get_user).delete(delete_user))
        .route("/api/users/{user_id}/families", get(get_user_families))
        .route("/api/users/{user_id}/relatives", get(get_user_relatives))
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub total: usize,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiOk<UsersResponse>>> {
    require_admin(&user)?;
    let users = state.families.list_users().await?;
    let total = users.len();
    Ok(ok(UsersResponse { users, total }))
}

#[derive(Serialize)]
pub struct UserBody {
    pub user: User,
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiOk<UserBody>>> {
    require_self_or_admin(&user, &user_id)?;
    let profile = state.families.get_user_by_id(&user_id).await?;
    Ok(ok(UserBody { user: profile }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub memberships_removed: usize,
}

/// Hard-delete a user and their memberships.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiOk<DeleteUserResponse>>> {
    require_admin(&user)?;
    tracing::info!(admin = %user.user_id, target = %user_id, "Admin user deletion");
    let memberships_removed = state.families.delete_user(&user_id).await?;
    Ok(ok(DeleteUserResponse {
        memberships_removed,
    }))
}

#[derive(Serialize)]
pub struct FamiliesResponse {
    pub families: Vec<Family>,
}

async fn get_user_families(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiOk<FamiliesResponse>>> {
    require_self_or_admin(&user, &user_id)?;
    let families = state.families.get_user_families(&user_id).await?;
    Ok(ok(FamiliesResponse { families }))
}

#[derive(Serialize)]
pub struct RelativesResponse {
    pub relatives: Vec<Relative>,
}

async fn get_user_relatives(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiOk<RelativesResponse>>> {
    require_self_or_admin(&user, &user_id)?;
    let locale = query.resolve(state.config.default_locale)?;
    let relatives = state.resolver.get_family_by_user_id(&user_id, locale).await?;
    Ok(ok(RelativesResponse { relatives }))
}
