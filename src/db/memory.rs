//! In-memory [`FamilyStore`] backed by `DashMap`.
//!
//! Mirrors the Firestore layout (one map per collection, members keyed by
//! `(family_id, user_id)`) so services behave the same against either store.

use crate::db::FamilyStore;
use crate::error::AppError;
use crate::models::{Family, FamilyMember, User};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    families: DashMap<String, Family>,
    members: DashMap<(String, String), FamilyMember>,
    /// When set, every operation fails like an unreachable backend.
    offline: AtomicBool,
    /// Families whose document and member reads/writes fail.
    failing_families: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated backend failure.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every operation on one family fail (or succeed again).
    pub fn set_family_failing(&self, family_id: &str, failing: bool) {
        if failing {
            self.failing_families.insert(family_id.to_string());
        } else {
            self.failing_families.remove(family_id);
        }
    }

    fn check_family(&self, family_id: &str) -> Result<(), AppError> {
        self.check()?;
        if self.failing_families.contains(family_id) {
            return Err(AppError::Database(format!(
                "Family {} unavailable",
                family_id
            )));
        }
        Ok(())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FamilyStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.check()?;
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.check()?;
        self.users.remove(user_id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.check()?;
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(users)
    }

    async fn get_family(&self, family_id: &str) -> Result<Option<Family>, AppError> {
        self.check_family(family_id)?;
        Ok(self.families.get(family_id).map(|f| f.clone()))
    }

    async fn upsert_family(&self, family: &Family) -> Result<(), AppError> {
        self.check_family(&family.id)?;
        self.families.insert(family.id.clone(), family.clone());
        Ok(())
    }

    async fn families_created_by(&self, user_id: &str) -> Result<Vec<Family>, AppError> {
        self.check()?;
        let mut families: Vec<Family> = self
            .families
            .iter()
            .filter(|f| f.created_by == user_id)
            .map(|f| f.value().clone())
            .collect();
        families.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(families)
    }

    async fn get_member(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> Result<Option<FamilyMember>, AppError> {
        self.check_family(family_id)?;
        let key = (family_id.to_string(), user_id.to_string());
        Ok(self.members.get(&key).map(|m| m.clone()))
    }

    async fn upsert_member(&self, family_id: &str, member: &FamilyMember) -> Result<(), AppError> {
        self.check_family(family_id)?;
        let key = (family_id.to_string(), member.user_id.clone());
        self.members.insert(key, member.clone());
        Ok(())
    }

    async fn delete_member(&self, family_id: &str, user_id: &str) -> Result<(), AppError> {
        self.check_family(family_id)?;
        let key = (family_id.to_string(), user_id.to_string());
        self.members.remove(&key);
        Ok(())
    }

    async fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>, AppError> {
        self.check_family(family_id)?;
        let mut members: Vec<FamilyMember> = self
            .members
            .iter()
            .filter(|entry| entry.key().0 == family_id)
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(members)
    }
}
