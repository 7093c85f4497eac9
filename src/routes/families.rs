// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family and member routes.

use super::{ok, require_family_admin, require_family_member, ApiOk};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FamilyMember, FamilyRole, MemberWithProfile, RelationCode, UserSummary};
use crate::services::{DeleteOutcome, MemberUpdate, NewMember, OwnedFamily};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/families", post(create_family))
        .route(
            "/api/families/{family_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/api/families/{family_id}/members/{user_id}",
            put(update_member).delete(delete_member),
        )
        .route("/api/families/{family_id}/candidates", get(search_candidates))
}

/// Relation codes accepted from clients. Stored documents may still hold
/// other codes; those are displayed verbatim.
fn ensure_known_relation(relation: &RelationCode) -> Result<()> {
    if relation.is_known() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unknown relation '{}'",
            relation
        )))
    }
}

// ─── Families ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateFamilyRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: Option<String>,
}

/// Create the caller's own family and link families they already belong to.
async fn create_family(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateFamilyRequest>,
) -> Result<Json<ApiOk<OwnedFamily>>> {
    body.validate()?;
    let owned = state
        .onboarding
        .create_family(&user.user_id, body.name.as_deref())
        .await?;
    Ok(ok(owned))
}

// ─── Members ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MembersResponse {
    pub members: Vec<MemberWithProfile>,
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(family_id): Path<String>,
) -> Result<Json<ApiOk<MembersResponse>>> {
    require_family_member(&state, &user, &family_id).await?;
    let members = state.families.get_family_members(&family_id).await?;
    Ok(ok(MembersResponse { members }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1-128 characters"))]
    pub user_id: String,
    pub relation: RelationCode,
    #[serde(default)]
    pub role: FamilyRole,
}

#[derive(Serialize)]
pub struct MemberBody {
    pub member: FamilyMember,
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(family_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<ApiOk<MemberBody>>> {
    body.validate()?;
    ensure_known_relation(&body.relation)?;
    require_family_admin(&state, &user, &family_id).await?;

    let member = state
        .families
        .add_user_to_family(
            &family_id,
            NewMember {
                user_id: body.user_id,
                relation: body.relation,
                role: body.role,
            },
            &user.user_id,
        )
        .await?;
    Ok(ok(MemberBody { member }))
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub relation: Option<RelationCode>,
    pub role: Option<FamilyRole>,
}

async fn update_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((family_id, member_id)): Path<(String, String)>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<ApiOk<MemberBody>>> {
    if body.relation.is_none() && body.role.is_none() {
        return Err(AppError::BadRequest(
            "Nothing to update: provide 'relation' or 'role'".to_string(),
        ));
    }
    if let Some(relation) = &body.relation {
        ensure_known_relation(relation)?;
    }
    require_family_admin(&state, &user, &family_id).await?;

    let member = state
        .families
        .update_family_member(
            &family_id,
            &member_id,
            MemberUpdate {
                relation: body.relation,
                role: body.role,
            },
        )
        .await?;
    Ok(ok(MemberBody { member }))
}

#[derive(Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Delete the user when this is their only family.
    #[default]
    Smart,
    /// Only remove the membership.
    Detach,
}

#[derive(Deserialize)]
pub struct DeleteMemberQuery {
    #[serde(default)]
    pub mode: DeleteMode,
}

#[derive(Serialize)]
pub struct DeleteMemberResponse {
    pub outcome: DeleteOutcome,
}

async fn delete_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((family_id, member_id)): Path<(String, String)>,
    Query(query): Query<DeleteMemberQuery>,
) -> Result<Json<ApiOk<DeleteMemberResponse>>> {
    require_family_admin(&state, &user, &family_id).await?;

    let outcome = match query.mode {
        DeleteMode::Detach => {
            state
                .families
                .remove_user_from_family(&family_id, &member_id)
                .await?;
            DeleteOutcome::Detached
        }
        DeleteMode::Smart => {
            state
                .families
                .delete_family_member(&family_id, &member_id)
                .await?
        }
    };

    tracing::info!(
        family_id = %family_id,
        member_id = %member_id,
        by = %user.user_id,
        ?outcome,
        "Member delete handled"
    );
    Ok(ok(DeleteMemberResponse { outcome }))
}

// ─── Candidates ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CandidatesQuery {
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct CandidatesResponse {
    pub users: Vec<UserSummary>,
}

/// Users that can be added to the family, filtered by name or email.
async fn search_candidates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(family_id): Path<String>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<ApiOk<CandidatesResponse>>> {
    query.validate()?;
    require_family_admin(&state, &user, &family_id).await?;

    let users = state
        .families
        .search_users_to_add_to_family(
            &family_id,
            &user.user_id,
            query.q.as_deref().unwrap_or(""),
        )
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(ok(CandidatesResponse { users }))
}
