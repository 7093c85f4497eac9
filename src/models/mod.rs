// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod family;
pub mod relation;
pub mod user;

pub use family::{Family, FamilyMember, FamilyRole, MemberWithProfile, Relative};
pub use relation::{inverse_relation, relation_label, Locale, RelationCode};
pub use user::{Gender, Role, User, UserSummary};
