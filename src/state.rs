// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::auth::{
    AuthorizationEvaluator, Authenticator, CredentialVerifier, EvaluatorConfig, ReplayGuard,
    SocialProviders, StaticCredentials,
};
use crate::config::DEFAULT_REPLAY_CACHE_SIZE;
use crate::session::{InMemorySessionStore, SessionManager, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub authenticator: Arc<Authenticator>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub social: SocialProviders,
}

impl AppState {
    /// Wire the evaluator and lifecycle over one shared store.
    pub fn new(
        store: Arc<dyn SessionStore>,
        evaluator: EvaluatorConfig,
        replay_cache_size: Option<NonZeroUsize>,
    ) -> Self {
        let sessions = SessionManager::new(store.clone());
        let authenticator = Authenticator::new(
            AuthorizationEvaluator::new(store, evaluator),
            sessions.clone(),
            replay_cache_size.map(ReplayGuard::new),
        );
        Self {
            sessions,
            authenticator: Arc::new(authenticator),
            credentials: Arc::new(StaticCredentials::default()),
            social: SocialProviders::new(),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_social_providers(mut self, social: SocialProviders) -> Self {
        self.social = social;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(InMemorySessionStore::new()),
            EvaluatorConfig::default(),
            NonZeroUsize::new(DEFAULT_REPLAY_CACHE_SIZE),
        )
    }
}
