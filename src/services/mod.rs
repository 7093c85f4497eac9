// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod family;
pub mod onboarding;
pub mod resolver;

pub use family::{DeleteOutcome, FamilyService, MemberUpdate, NewMember};
pub use onboarding::{OnboardingService, OwnedFamily, Registration, SessionProfile};
pub use resolver::{RelationResolver, RepairEntry, RepairOutcome, RepairReport};
