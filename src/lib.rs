// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Church family directory backend.
//!
//! Keeps member profiles and family groups in Firestore and resolves, for
//! any member, who their relatives are and how to label them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FamilyStore;
use services::{FamilyService, OnboardingService, RelationResolver};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub families: FamilyService,
    pub resolver: RelationResolver,
    pub onboarding: OnboardingService,
}

impl AppState {
    /// Wire the services over one store.
    pub fn new(config: Config, store: Arc<dyn FamilyStore>) -> Self {
        let families = FamilyService::new(store.clone());
        let resolver = RelationResolver::new(store, config.label_gender_source);
        let onboarding = OnboardingService::new(families.clone(), resolver.clone());

        Self {
            config,
            families,
            resolver,
            onboarding,
        }
    }
}
