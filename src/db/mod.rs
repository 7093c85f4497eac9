//! Database layer (Firestore, plus an in-memory store for tests and local dev).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Family, FamilyMember, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FAMILIES: &str = "families";
    /// Subcollection under each family document, keyed by member uid
    pub const MEMBERS: &str = "members";
}

/// Document-level access to users, families and family members.
///
/// Implementations do no business validation; that lives in
/// [`crate::services::FamilyService`].
#[async_trait]
pub trait FamilyStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Create or replace a user document.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    // ─── Families ────────────────────────────────────────────────

    async fn get_family(&self, family_id: &str) -> Result<Option<Family>, AppError>;

    async fn upsert_family(&self, family: &Family) -> Result<(), AppError>;

    /// Families whose `createdBy` is `user_id`.
    async fn families_created_by(&self, user_id: &str) -> Result<Vec<Family>, AppError>;

    // ─── Members ─────────────────────────────────────────────────

    async fn get_member(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> Result<Option<FamilyMember>, AppError>;

    async fn upsert_member(&self, family_id: &str, member: &FamilyMember) -> Result<(), AppError>;

    async fn delete_member(&self, family_id: &str, user_id: &str) -> Result<(), AppError>;

    async fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>, AppError>;
}
