// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! First-login handling.
//!
//! On every session start the profile is created or refreshed and the
//! user's own family is ensured. Whenever a user's own family is created,
//! here or through the family routes, links to families the user was
//! already added to are synthesized.

use crate::error::Result;
use crate::models::{Family, Gender, User};
use crate::services::family::FamilyService;
use crate::services::resolver::{RelationResolver, RepairReport};
use serde::Serialize;

/// Identity fields reported by the auth provider at login.
#[derive(Debug, Clone, Default)]
pub struct SessionProfile {
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub gender: Option<Gender>,
}

/// Outcome of [`OnboardingService::register`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user: User,
    pub family: Family,
    pub family_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairReport>,
}

/// The caller's own family, with the link report when it was just created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedFamily {
    pub family: Family,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairReport>,
}

#[derive(Clone)]
pub struct OnboardingService {
    families: FamilyService,
    resolver: RelationResolver,
}

impl OnboardingService {
    pub fn new(families: FamilyService, resolver: RelationResolver) -> Self {
        Self { families, resolver }
    }

    /// Create or refresh `user_id`'s profile and make sure they own a family.
    pub async fn register(&self, user_id: &str, profile: SessionProfile) -> Result<Registration> {
        let now = chrono::Utc::now().to_rfc3339();

        let user = match self.families.get_user_by_id(user_id).await {
            Ok(mut existing) => {
                let name = profile.display_name.trim();
                if !name.is_empty() {
                    existing.display_name = name.to_string();
                }
                if let Some(gender) = profile.gender {
                    existing.gender = gender;
                }
                if profile.email.is_some() {
                    existing.email = profile.email;
                }
                if profile.photo_url.is_some() {
                    existing.photo_url = profile.photo_url;
                }
                existing.has_web_access = true;
                existing.updated_at = now;
                existing
            }
            Err(crate::error::AppError::NotFound(_)) => {
                tracing::info!(user_id, "First login; creating profile");
                let mut user = User::new(user_id, profile.display_name, &now);
                user.email = profile.email;
                user.photo_url = profile.photo_url;
                user.gender = profile.gender.unwrap_or_default();
                user
            }
            Err(e) => return Err(e),
        };
        self.families.save_user(&user).await?;

        let owned = self.ensure_family(user_id).await?;

        // Family creation and repair both touch the profile.
        let user = self.families.get_user_by_id(user_id).await?;

        Ok(Registration {
            user,
            family: owned.family,
            family_created: owned.created,
            repair: owned.repair,
        })
    }

    /// The family `user_id` owns, created and linked when missing.
    pub async fn ensure_family(&self, user_id: &str) -> Result<OwnedFamily> {
        let (family, created) = self
            .families
            .get_or_create_family_by_user_id(user_id)
            .await?;

        let repair = if created {
            Some(self.resolver.setup_bidirectional_relations(user_id).await?)
        } else {
            None
        };
        Ok(OwnedFamily {
            family,
            created,
            repair,
        })
    }

    /// Create `user_id`'s own family, then link the creators of families
    /// they already belong to.
    pub async fn create_family(&self, user_id: &str, name: Option<&str>) -> Result<OwnedFamily> {
        let family = self.families.create_family(user_id, name).await?;
        let report = self.resolver.setup_bidirectional_relations(user_id).await?;

        Ok(OwnedFamily {
            family,
            created: true,
            repair: Some(report),
        })
    }
}
