// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family and member CRUD on top of a [`FamilyStore`].
//!
//! Keeps the two sides of a membership in step: the member document under
//! `families/{id}/members/{uid}` and the family id in `users/{uid}.families`.
//! Writes are not transactional; a failure between the two leaves the
//! earlier write in place (last write wins on retry).

use crate::db::FamilyStore;
use crate::error::{AppError, Result};
use crate::models::{Family, FamilyMember, FamilyRole, MemberWithProfile, RelationCode, User};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Upper bound on concurrent profile lookups when joining members to users.
const MAX_CONCURRENT_READS: usize = 16;

/// Input for adding a user to a family.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub user_id: String,
    pub relation: RelationCode,
    pub role: FamilyRole,
}

/// Partial update of a member record.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub relation: Option<RelationCode>,
    pub role: Option<FamilyRole>,
}

/// What `delete_family_member` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// This was the user's only family; the user document is gone too.
    UserDeleted,
    /// The user stays; only this membership was removed.
    Detached,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Load profiles for `ids`, skipping ids with no user document.
pub(crate) async fn fetch_profiles(
    store: &dyn FamilyStore,
    ids: Vec<String>,
) -> Result<HashMap<String, User>> {
    let users: Vec<Option<User>> = stream::iter(ids)
        .map(|id| async move { store.get_user(&id).await })
        .buffered(MAX_CONCURRENT_READS)
        .try_collect()
        .await?;

    Ok(users
        .into_iter()
        .flatten()
        .map(|u| (u.id.clone(), u))
        .collect())
}

/// Typed family/member operations.
#[derive(Clone)]
pub struct FamilyService {
    store: Arc<dyn FamilyStore>,
}

impl FamilyService {
    pub fn new(store: Arc<dyn FamilyStore>) -> Self {
        Self { store }
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn save_user(&self, user: &User) -> Result<()> {
        self.store.upsert_user(user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }

    /// Delete a user and every membership they hold.
    ///
    /// Families the user created stay in place. Returns the number of
    /// membership records removed.
    pub async fn delete_user(&self, user_id: &str) -> Result<usize> {
        let user = self.get_user_by_id(user_id).await?;

        let mut removed = 0;
        for family_id in &user.families {
            self.store.delete_member(family_id, user_id).await?;
            removed += 1;
        }
        self.store.delete_user(user_id).await?;

        tracing::info!(user_id, memberships = removed, "User deleted");
        Ok(removed)
    }

    // ─── Families ────────────────────────────────────────────────

    pub async fn get_family(&self, family_id: &str) -> Result<Family> {
        self.store
            .get_family(family_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", family_id)))
    }

    /// The family `user_id` created, if any.
    pub async fn get_owned_family(&self, user_id: &str) -> Result<Option<Family>> {
        let mut owned = self.store.families_created_by(user_id).await?;
        if owned.len() > 1 {
            tracing::warn!(
                user_id,
                count = owned.len(),
                "User owns more than one family; using the oldest"
            );
        }
        Ok(if owned.is_empty() {
            None
        } else {
            Some(owned.swap_remove(0))
        })
    }

    /// Create the family owned by `owner_id`.
    ///
    /// A user owns at most one family; a second attempt is a conflict.
    pub async fn create_family(&self, owner_id: &str, name: Option<&str>) -> Result<Family> {
        let mut owner = self.get_user_by_id(owner_id).await?;

        if let Some(existing) = self.get_owned_family(owner_id).await? {
            return Err(AppError::Conflict(format!(
                "User {} already owns family {}",
                owner_id, existing.id
            )));
        }

        let now = now();
        let family = Family {
            id: uuid::Uuid::new_v4().to_string(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Familia {}", owner.display_name)),
            created_by: owner_id.to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        self.store.upsert_family(&family).await?;

        let owner_entry = FamilyMember {
            user_id: owner_id.to_string(),
            relation: None,
            role: FamilyRole::Admin,
            added_by: owner_id.to_string(),
            joined_at: now.clone(),
        };
        self.store.upsert_member(&family.id, &owner_entry).await?;

        if !owner.families.contains(&family.id) {
            owner.families.push(family.id.clone());
        }
        owner.updated_at = now;
        self.store.upsert_user(&owner).await?;

        tracing::info!(owner_id, family_id = %family.id, "Family created");
        Ok(family)
    }

    /// Return the family `user_id` owns, creating one if needed.
    ///
    /// The flag is true when the family was created by this call.
    pub async fn get_or_create_family_by_user_id(&self, user_id: &str) -> Result<(Family, bool)> {
        if let Some(family) = self.get_owned_family(user_id).await? {
            return Ok((family, false));
        }
        let family = self.create_family(user_id, None).await?;
        Ok((family, true))
    }

    /// Families `user_id` belongs to. Ids with no family document are skipped.
    pub async fn get_user_families(&self, user_id: &str) -> Result<Vec<Family>> {
        let user = self.get_user_by_id(user_id).await?;

        let mut families = Vec::with_capacity(user.families.len());
        for family_id in &user.families {
            match self.store.get_family(family_id).await? {
                Some(family) => families.push(family),
                None => tracing::warn!(user_id, family_id = %family_id, "Dangling family reference"),
            }
        }
        Ok(families)
    }

    // ─── Members ─────────────────────────────────────────────────

    pub async fn get_member(&self, family_id: &str, user_id: &str) -> Result<Option<FamilyMember>> {
        self.store.get_member(family_id, user_id).await
    }

    /// Members of a family joined with their profiles.
    pub async fn get_family_members(&self, family_id: &str) -> Result<Vec<MemberWithProfile>> {
        self.get_family(family_id).await?;

        let members = self.store.list_members(family_id).await?;
        let ids = members.iter().map(|m| m.user_id.clone()).collect();
        let profiles = fetch_profiles(self.store.as_ref(), ids).await?;

        Ok(members
            .into_iter()
            .filter_map(|m| match profiles.get(&m.user_id) {
                Some(user) => Some(MemberWithProfile::new(m, user)),
                None => {
                    tracing::warn!(family_id, user_id = %m.user_id, "Member has no user profile");
                    None
                }
            })
            .collect())
    }

    /// Add an existing user to a family.
    pub async fn add_user_to_family(
        &self,
        family_id: &str,
        input: NewMember,
        added_by: &str,
    ) -> Result<FamilyMember> {
        let family = self.get_family(family_id).await?;
        let mut user = self.get_user_by_id(&input.user_id).await?;

        if family.created_by == input.user_id {
            return Err(AppError::BadRequest(
                "The family creator is already part of the family".to_string(),
            ));
        }
        if self.store.get_member(family_id, &input.user_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User {} is already a member of family {}",
                input.user_id, family_id
            )));
        }

        let now = now();
        let member = FamilyMember {
            user_id: input.user_id,
            relation: Some(input.relation),
            role: input.role,
            added_by: added_by.to_string(),
            joined_at: now.clone(),
        };
        self.store.upsert_member(family_id, &member).await?;

        if !user.families.iter().any(|f| f == family_id) {
            user.families.push(family_id.to_string());
        }
        user.updated_at = now;
        self.store.upsert_user(&user).await?;

        tracing::info!(
            family_id,
            user_id = %member.user_id,
            relation = ?member.relation,
            added_by,
            "Member added"
        );
        Ok(member)
    }

    pub async fn update_family_member(
        &self,
        family_id: &str,
        user_id: &str,
        update: MemberUpdate,
    ) -> Result<FamilyMember> {
        let mut member = self.store.get_member(family_id, user_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "User {} is not a member of family {}",
                user_id, family_id
            ))
        })?;

        if let Some(relation) = update.relation {
            member.relation = Some(relation);
        }
        if let Some(role) = update.role {
            member.role = role;
        }
        self.store.upsert_member(family_id, &member).await?;

        tracing::debug!(family_id, user_id, "Member updated");
        Ok(member)
    }

    /// Detach a user from one family, keeping the user document.
    pub async fn remove_user_from_family(&self, family_id: &str, user_id: &str) -> Result<()> {
        let family = self.get_family(family_id).await?;
        if family.created_by == user_id {
            return Err(AppError::BadRequest(
                "The family creator cannot be removed from their own family".to_string(),
            ));
        }
        if self.store.get_member(family_id, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of family {}",
                user_id, family_id
            )));
        }

        self.store.delete_member(family_id, user_id).await?;

        if let Some(mut user) = self.store.get_user(user_id).await? {
            user.families.retain(|f| f != family_id);
            user.updated_at = now();
            self.store.upsert_user(&user).await?;
        }

        tracing::info!(family_id, user_id, "Member removed");
        Ok(())
    }

    /// Remove a member; delete the user entirely when this was their only family.
    pub async fn delete_family_member(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> Result<DeleteOutcome> {
        let family = self.get_family(family_id).await?;
        if family.created_by == user_id {
            return Err(AppError::BadRequest(
                "The family creator cannot be removed from their own family".to_string(),
            ));
        }
        if self.store.get_member(family_id, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of family {}",
                user_id, family_id
            )));
        }

        let user = self.store.get_user(user_id).await?;
        match user {
            Some(user) if user.families.iter().all(|f| f == family_id) => {
                self.store.delete_member(family_id, user_id).await?;
                self.store.delete_user(user_id).await?;
                tracing::info!(family_id, user_id, "Member deleted with user profile");
                Ok(DeleteOutcome::UserDeleted)
            }
            _ => {
                self.remove_user_from_family(family_id, user_id).await?;
                Ok(DeleteOutcome::Detached)
            }
        }
    }

    /// Users that can still be added to `family_id`.
    ///
    /// Excludes current members and the requester. `query` matches display
    /// name or email, case-insensitively; an empty query matches everyone.
    pub async fn search_users_to_add_to_family(
        &self,
        family_id: &str,
        requester_id: &str,
        query: &str,
    ) -> Result<Vec<User>> {
        let member_ids: HashSet<String> = self
            .store
            .list_members(family_id)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        let needle = query.trim().to_lowercase();
        let mut candidates: Vec<User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.id != requester_id && !member_ids.contains(&u.id))
            .filter(|u| u.matches_query(&needle))
            .collect();

        candidates.sort_by_key(|u| u.display_name.to_lowercase());
        Ok(candidates)
    }
}
