// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Relation resolution: who a user's relatives are, and how to label them.
//!
//! Member records store the relation from the family creator's point of
//! view. When the viewer owns the family the stored code is used as is.
//! When the viewer only belongs to families owned by others, the owner's
//! relation to the viewer is the inverse of the viewer's own entry.

use crate::config::LabelGenderSource;
use crate::db::FamilyStore;
use crate::error::{AppError, Result};
use crate::models::{
    inverse_relation, relation_label, Family, FamilyMember, FamilyRole, Gender, Locale,
    RelationCode, Relative, User,
};
use crate::services::family::fetch_profiles;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of linking one foreign family during bidirectional synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The family creator was added to the user's family.
    Linked {
        creator_id: String,
        relation: RelationCode,
    },
    /// The creator was already a member of the user's family.
    AlreadyLinked { creator_id: String },
    /// Nothing to link (missing data); not an error.
    Skipped { reason: String },
    /// A store call failed for this family.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairEntry {
    pub family_id: String,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
}

/// Per-family report of one `setup_bidirectional_relations` run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub user_id: String,
    /// The user's own family that links are written into
    pub family_id: String,
    pub entries: Vec<RepairEntry>,
}

impl RepairReport {
    pub fn linked(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Linked { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RepairOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Resolves relatives for a viewer and repairs missing reverse links.
#[derive(Clone)]
pub struct RelationResolver {
    store: Arc<dyn FamilyStore>,
    gender_source: LabelGenderSource,
}

impl RelationResolver {
    pub fn new(store: Arc<dyn FamilyStore>, gender_source: LabelGenderSource) -> Self {
        Self {
            store,
            gender_source,
        }
    }

    /// Relatives of `viewer_id`, labelled in `locale`.
    ///
    /// Unknown viewers and viewers without families have no relatives.
    pub async fn get_family_by_user_id(
        &self,
        viewer_id: &str,
        locale: Locale,
    ) -> Result<Vec<Relative>> {
        let Some(viewer) = self.store.get_user(viewer_id).await? else {
            tracing::debug!(viewer_id, "Unknown viewer; no relatives");
            return Ok(Vec::new());
        };

        let owned = self.store.families_created_by(viewer_id).await?;
        match owned.into_iter().next() {
            Some(family) => self.owned_family_relatives(&viewer, &family, locale).await,
            None => self.foreign_family_relatives(&viewer, locale).await,
        }
    }

    /// Viewer owns `family`: every other member, with the stored relation.
    async fn owned_family_relatives(
        &self,
        viewer: &User,
        family: &Family,
        locale: Locale,
    ) -> Result<Vec<Relative>> {
        let members: Vec<FamilyMember> = self
            .store
            .list_members(&family.id)
            .await?
            .into_iter()
            .filter(|m| m.user_id != viewer.id)
            .collect();

        let ids = members.iter().map(|m| m.user_id.clone()).collect();
        let profiles = fetch_profiles(self.store.as_ref(), ids).await?;

        let mut relatives = Vec::with_capacity(members.len());
        for member in members {
            let Some(relation) = member.relation else {
                tracing::debug!(family_id = %family.id, user_id = %member.user_id, "Member without relation");
                continue;
            };
            let Some(user) = profiles.get(&member.user_id) else {
                tracing::warn!(family_id = %family.id, user_id = %member.user_id, "Member has no user profile");
                continue;
            };

            let label_gender = self.label_gender(user.gender, viewer.gender);
            relatives.push(Relative {
                user_id: user.id.clone(),
                display_name: user.display_name.clone(),
                email: user.email.clone(),
                photo_url: user.photo_url.clone(),
                gender: user.gender,
                relation_label: relation_label(&relation, label_gender, locale),
                stored_relation: relation.clone(),
                relation,
                family_id: family.id.clone(),
                role: member.role,
                from_owned_family: true,
            });
        }
        Ok(relatives)
    }

    /// Viewer only belongs to other people's families: surface each owner once.
    async fn foreign_family_relatives(&self, viewer: &User, locale: Locale) -> Result<Vec<Relative>> {
        let mut seen_owners = HashSet::new();
        let mut relatives = Vec::new();

        for family_id in &viewer.families {
            let Some(family) = self.store.get_family(family_id).await? else {
                tracing::warn!(viewer_id = %viewer.id, family_id = %family_id, "Dangling family reference");
                continue;
            };
            if family.created_by == viewer.id || seen_owners.contains(&family.created_by) {
                continue;
            }

            let Some(stored) = self
                .store
                .get_member(family_id, &viewer.id)
                .await?
                .and_then(|m| m.relation)
            else {
                continue;
            };
            let Some(owner) = self.store.get_user(&family.created_by).await? else {
                tracing::warn!(family_id = %family_id, owner_id = %family.created_by, "Family owner has no profile");
                continue;
            };

            let relation = inverse_relation(&stored, owner.gender);
            // The owner is both the person shown and the family creator here.
            let label_gender = self.label_gender(owner.gender, owner.gender);

            seen_owners.insert(owner.id.clone());
            relatives.push(Relative {
                user_id: owner.id.clone(),
                display_name: owner.display_name.clone(),
                email: owner.email.clone(),
                photo_url: owner.photo_url.clone(),
                gender: owner.gender,
                relation_label: relation_label(&relation, label_gender, locale),
                relation,
                stored_relation: stored,
                family_id: family.id.clone(),
                role: FamilyRole::Admin,
                from_owned_family: false,
            });
        }
        Ok(relatives)
    }

    fn label_gender(&self, related: Gender, creator: Gender) -> Gender {
        match self.gender_source {
            LabelGenderSource::Related => related,
            LabelGenderSource::Creator => creator,
        }
    }

    /// Mirror `user_id`'s memberships in other families into their own family.
    ///
    /// For every foreign family, the creator is added to the user's family
    /// with the inverse of the user's stored relation. Creators already
    /// present are left alone, so the job can be re-run safely. A failure on
    /// one family is recorded in the report and does not stop the others.
    pub async fn setup_bidirectional_relations(&self, user_id: &str) -> Result<RepairReport> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let own = self
            .store
            .families_created_by(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("User {} owns no family", user_id)))?;

        let mut entries = Vec::new();
        for family_id in user.families.iter().filter(|f| **f != own.id) {
            let outcome = match self.link_family(&user, &own, family_id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(user_id, family_id = %family_id, error = %e, "Failed to link family");
                    RepairOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            entries.push(RepairEntry {
                family_id: family_id.clone(),
                outcome,
            });
        }

        let report = RepairReport {
            user_id: user_id.to_string(),
            family_id: own.id,
            entries,
        };
        tracing::info!(
            user_id,
            linked = report.linked(),
            failed = report.failed(),
            total = report.entries.len(),
            "Bidirectional relations set up"
        );
        Ok(report)
    }

    async fn link_family(&self, user: &User, own: &Family, family_id: &str) -> Result<RepairOutcome> {
        let skipped = |reason: &str| -> Result<RepairOutcome> {
            Ok(RepairOutcome::Skipped {
                reason: reason.to_string(),
            })
        };

        let Some(family) = self.store.get_family(family_id).await? else {
            return skipped("family not found");
        };
        if family.created_by == user.id {
            return skipped("family owned by user");
        }
        let Some(entry) = self.store.get_member(family_id, &user.id).await? else {
            return skipped("no membership entry");
        };
        let Some(stored) = entry.relation else {
            return skipped("no relation recorded");
        };
        let Some(mut creator) = self.store.get_user(&family.created_by).await? else {
            return skipped("creator not found");
        };

        if self.store.get_member(&own.id, &creator.id).await?.is_some() {
            return Ok(RepairOutcome::AlreadyLinked {
                creator_id: creator.id,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let relation = inverse_relation(&stored, creator.gender);
        let member = FamilyMember {
            user_id: creator.id.clone(),
            relation: Some(relation.clone()),
            role: FamilyRole::Member,
            added_by: user.id.clone(),
            joined_at: now.clone(),
        };
        self.store.upsert_member(&own.id, &member).await?;

        if !creator.families.contains(&own.id) {
            creator.families.push(own.id.clone());
            creator.updated_at = now;
            self.store.upsert_user(&creator).await?;
        }

        tracing::debug!(
            user_id = %user.id,
            creator_id = %creator.id,
            %relation,
            "Reverse relation linked"
        );
        Ok(RepairOutcome::Linked {
            creator_id: creator.id,
            relation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::family::{FamilyService, NewMember};

    async fn seed(store: &MemoryStore, id: &str, name: &str, gender: Gender) {
        let mut user = User::new(id, name, "2024-01-01T00:00:00Z");
        user.gender = gender;
        store.upsert_user(&user).await.unwrap();
    }

    fn add(user_id: &str, relation: RelationCode) -> NewMember {
        NewMember {
            user_id: user_id.to_string(),
            relation,
            role: FamilyRole::Member,
        }
    }

    /// A (male) owns F_A and adds B (female) as child.
    async fn parent_and_child(store: &Arc<MemoryStore>) -> (FamilyService, Family) {
        seed(store, "a", "Andrés", Gender::Male).await;
        seed(store, "b", "Bea", Gender::Female).await;
        let families = FamilyService::new(store.clone());
        let fa = families.create_family("a", None).await.unwrap();
        families
            .add_user_to_family(&fa.id, add("b", RelationCode::Child), "a")
            .await
            .unwrap();
        (families, fa)
    }

    #[tokio::test]
    async fn test_owner_sees_members_with_stored_relation() {
        let store = Arc::new(MemoryStore::new());
        let (_, fa) = parent_and_child(&store).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let relatives = resolver.get_family_by_user_id("a", Locale::En).await.unwrap();
        assert_eq!(relatives.len(), 1);
        let b = &relatives[0];
        assert_eq!(b.user_id, "b");
        assert_eq!(b.relation, RelationCode::Child);
        assert_eq!(b.relation_label, "Daughter");
        assert_eq!(b.family_id, fa.id);
        assert!(b.from_owned_family);
    }

    #[tokio::test]
    async fn test_owner_never_listed_as_own_relative() {
        let store = Arc::new(MemoryStore::new());
        parent_and_child(&store).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let relatives = resolver.get_family_by_user_id("a", Locale::Es).await.unwrap();
        assert!(relatives.iter().all(|r| r.user_id != "a"));
    }

    #[tokio::test]
    async fn test_non_owner_sees_owner_with_inverted_relation() {
        let store = Arc::new(MemoryStore::new());
        parent_and_child(&store).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let relatives = resolver.get_family_by_user_id("b", Locale::En).await.unwrap();
        assert_eq!(relatives.len(), 1);
        let a = &relatives[0];
        assert_eq!(a.user_id, "a");
        assert_eq!(a.stored_relation, RelationCode::Child);
        assert_eq!(a.relation, RelationCode::Parent);
        assert_eq!(a.relation_label, "Father");
        assert!(!a.from_owned_family);
    }

    #[tokio::test]
    async fn test_creator_gender_source_labels_owner_view_by_owner() {
        let store = Arc::new(MemoryStore::new());
        parent_and_child(&store).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Creator);

        // B is female but the family creator A is male.
        let relatives = resolver.get_family_by_user_id("a", Locale::En).await.unwrap();
        assert_eq!(relatives[0].relation_label, "Son");

        // Foreign view: the shown person is the creator, both sources agree.
        let relatives = resolver.get_family_by_user_id("b", Locale::En).await.unwrap();
        assert_eq!(relatives[0].relation_label, "Father");
    }

    #[tokio::test]
    async fn test_owners_collapsed_across_families() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "Andrés", Gender::Male).await;
        seed(&store, "b", "Bea", Gender::Female).await;
        let families = FamilyService::new(store.clone());
        let fa = families.create_family("a", None).await.unwrap();
        families
            .add_user_to_family(&fa.id, add("b", RelationCode::Sibling), "a")
            .await
            .unwrap();

        // A second family pointing at the same owner, written directly since
        // the service only allows one owned family.
        let dup = Family {
            id: "dup".to_string(),
            name: "Duplicada".to_string(),
            created_by: "a".to_string(),
            created_at: "2030-01-01T00:00:00Z".to_string(),
            updated_at: "2030-01-01T00:00:00Z".to_string(),
        };
        store.upsert_family(&dup).await.unwrap();
        store
            .upsert_member(
                "dup",
                &FamilyMember {
                    user_id: "b".to_string(),
                    relation: Some(RelationCode::Sibling),
                    role: FamilyRole::Member,
                    added_by: "a".to_string(),
                    joined_at: "2030-01-01T00:00:00Z".to_string(),
                },
            )
            .await
            .unwrap();
        let mut b = store.get_user("b").await.unwrap().unwrap();
        b.families.push("dup".to_string());
        store.upsert_user(&b).await.unwrap();

        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);
        let relatives = resolver.get_family_by_user_id("b", Locale::Es).await.unwrap();
        assert_eq!(relatives.len(), 1);
        assert_eq!(relatives[0].relation_label, "Hermano");
    }

    #[tokio::test]
    async fn test_user_without_families_has_no_relatives() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "solo", "Solo", Gender::Other).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        assert!(resolver
            .get_family_by_user_id("solo", Locale::En)
            .await
            .unwrap()
            .is_empty());
        assert!(resolver
            .get_family_by_user_id("nobody", Locale::En)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_relation_code_passes_through() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "Andrés", Gender::Male).await;
        seed(&store, "f", "Fede", Gender::Male).await;
        let families = FamilyService::new(store.clone());
        let fa = families.create_family("a", None).await.unwrap();
        families
            .add_user_to_family(&fa.id, add("f", RelationCode::from("friend")), "a")
            .await
            .unwrap();
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let owner_view = resolver.get_family_by_user_id("a", Locale::En).await.unwrap();
        assert_eq!(owner_view[0].relation_label, "friend");

        let member_view = resolver.get_family_by_user_id("f", Locale::En).await.unwrap();
        assert_eq!(member_view[0].relation, RelationCode::from("friend"));
        assert_eq!(member_view[0].relation_label, "friend");
    }

    #[tokio::test]
    async fn test_bidirectional_setup_adds_creator_with_inverse() {
        let store = Arc::new(MemoryStore::new());
        let (families, fa) = parent_and_child(&store).await;
        let fb = families.create_family("b", None).await.unwrap();
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let report = resolver.setup_bidirectional_relations("b").await.unwrap();
        assert_eq!(report.family_id, fb.id);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].family_id, fa.id);
        assert_eq!(
            report.entries[0].outcome,
            RepairOutcome::Linked {
                creator_id: "a".to_string(),
                relation: RelationCode::Parent,
            }
        );

        let a_in_fb = store.get_member(&fb.id, "a").await.unwrap().unwrap();
        assert_eq!(a_in_fb.relation, Some(RelationCode::Parent));
        assert_eq!(a_in_fb.added_by, "b");
        let a = store.get_user("a").await.unwrap().unwrap();
        assert!(a.families.contains(&fb.id));

        // B now owns a family, so B's view comes from F_B.
        let relatives = resolver.get_family_by_user_id("b", Locale::En).await.unwrap();
        assert_eq!(relatives.len(), 1);
        assert_eq!(relatives[0].relation_label, "Father");
    }

    #[tokio::test]
    async fn test_bidirectional_setup_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let (families, _) = parent_and_child(&store).await;
        let fb = families.create_family("b", None).await.unwrap();
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        resolver.setup_bidirectional_relations("b").await.unwrap();
        let second = resolver.setup_bidirectional_relations("b").await.unwrap();

        assert_eq!(second.linked(), 0);
        assert_eq!(
            second.entries[0].outcome,
            RepairOutcome::AlreadyLinked {
                creator_id: "a".to_string()
            }
        );
        assert_eq!(store.list_members(&fb.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bidirectional_setup_continues_after_family_failure() {
        let store = Arc::new(MemoryStore::new());
        let (families, fa) = parent_and_child(&store).await;
        seed(&store, "c", "Carmen", Gender::Female).await;
        let fc = families.create_family("c", None).await.unwrap();
        families
            .add_user_to_family(&fc.id, add("b", RelationCode::Sibling), "c")
            .await
            .unwrap();
        let fb = families.create_family("b", None).await.unwrap();
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        store.set_family_failing(&fa.id, true);
        let report = resolver.setup_bidirectional_relations("b").await.unwrap();

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.linked(), 1);
        let outcome_for = |family_id: &str| {
            report
                .entries
                .iter()
                .find(|e| e.family_id == family_id)
                .map(|e| e.outcome.clone())
                .unwrap()
        };
        assert!(matches!(outcome_for(&fa.id), RepairOutcome::Failed { .. }));
        assert_eq!(
            outcome_for(&fc.id),
            RepairOutcome::Linked {
                creator_id: "c".to_string(),
                relation: RelationCode::Sibling,
            }
        );
        assert!(store.get_member(&fb.id, "a").await.unwrap().is_none());

        // A later run picks up the family that failed.
        store.set_family_failing(&fa.id, false);
        let retry = resolver.setup_bidirectional_relations("b").await.unwrap();
        assert_eq!(retry.failed(), 0);
        assert_eq!(retry.linked(), 1);
        assert!(store.get_member(&fb.id, "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bidirectional_setup_records_missing_family() {
        let store = Arc::new(MemoryStore::new());
        let (families, _) = parent_and_child(&store).await;
        families.create_family("b", None).await.unwrap();
        let mut b = store.get_user("b").await.unwrap().unwrap();
        b.families.push("gone".to_string());
        store.upsert_user(&b).await.unwrap();
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let report = resolver.setup_bidirectional_relations("b").await.unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.linked(), 1);
        assert!(report.entries.iter().any(|e| e.family_id == "gone"
            && matches!(e.outcome, RepairOutcome::Skipped { .. })));
    }

    #[tokio::test]
    async fn test_bidirectional_setup_requires_owned_family() {
        let store = Arc::new(MemoryStore::new());
        parent_and_child(&store).await;
        let resolver = RelationResolver::new(store.clone(), LabelGenderSource::Related);

        let err = resolver.setup_bidirectional_relations("b").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
