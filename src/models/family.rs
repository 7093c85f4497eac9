// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family group and membership models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::relation::RelationCode;
use super::user::{Gender, User};

/// Family group stored in Firestore (`families/{familyId}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Family {
    pub id: String,
    pub name: String,
    /// uid of the user who owns this group
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Role of a member inside one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum FamilyRole {
    Admin,
    #[default]
    Member,
}

/// Member record (`families/{familyId}/members/{uid}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Member uid (also used as document ID)
    pub user_id: String,
    /// Relation describing this member from the family creator's view.
    /// `None` for the creator's own entry.
    pub relation: Option<RelationCode>,
    #[serde(default)]
    pub role: FamilyRole,
    pub added_by: String,
    pub joined_at: String,
}

/// Member record joined with the member's profile, for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithProfile {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub gender: Gender,
    pub is_member: bool,
    pub relation: Option<RelationCode>,
    pub role: FamilyRole,
    pub added_by: String,
    pub joined_at: String,
}

impl MemberWithProfile {
    pub fn new(member: FamilyMember, user: &User) -> Self {
        Self {
            user_id: member.user_id,
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
            gender: user.gender,
            is_member: user.is_member,
            relation: member.relation,
            role: member.role,
            added_by: member.added_by,
            joined_at: member.joined_at,
        }
    }
}

/// A relative as shown to one viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relative {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub gender: Gender,
    /// Relation of this person to the viewer
    pub relation: RelationCode,
    pub relation_label: String,
    /// Code as stored in the family document it came from
    pub stored_relation: RelationCode,
    pub family_id: String,
    pub role: FamilyRole,
    /// True when the viewer owns the family this entry came from
    pub from_owned_family: bool,
}
