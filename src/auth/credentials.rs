// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login collaborators.
//!
//! Password storage and social-provider token exchange live outside this
//! service; these traits are the seams they plug into. A successful login
//! only has to name a principal id, and the session lifecycle takes over.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::signature::signatures_match;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential backend unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a login and names the principal it belongs to.
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(None)` means the credentials are wrong.
    fn verify(&self, identifier: &str, secret: &str) -> Result<Option<String>, CredentialError>;
}

pub type ConnectorFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, CredentialError>> + Send + 'a>>;

/// Exchanges a social-provider access token for a stable principal id.
pub trait SocialConnector: Send + Sync {
    /// `Ok(None)` means the provider rejected the token.
    fn resolve_principal<'a>(&'a self, access_token: &'a str) -> ConnectorFuture<'a>;
}

/// Registry of social connectors keyed by provider id (e.g. `github`).
#[derive(Clone, Default)]
pub struct SocialProviders {
    connectors: HashMap<String, Arc<dyn SocialConnector>>,
}

impl SocialProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(
        mut self,
        provider_id: impl Into<String>,
        connector: Arc<dyn SocialConnector>,
    ) -> Self {
        self.connectors.insert(provider_id.into(), connector);
        self
    }

    pub fn get(&self, provider_id: &str) -> Option<&Arc<dyn SocialConnector>> {
        self.connectors.get(provider_id)
    }
}

/// Fixed identifier → secret list loaded from `AUTH_USERS`.
///
/// WARNING: This should only be used in development environments. Secrets are
/// held as SHA-256 digests, which is not a password hash.
#[derive(Default)]
pub struct StaticCredentials {
    digests: HashMap<String, [u8; 32]>,
}

impl StaticCredentials {
    /// Parse `id:secret,id:secret`. Entries without a `:` are skipped.
    pub fn parse(list: &str) -> Self {
        let digests = list
            .split(',')
            .filter_map(|entry| entry.trim().split_once(':'))
            .filter(|(id, secret)| !id.is_empty() && !secret.is_empty())
            .map(|(id, secret)| (id.to_string(), Sha256::digest(secret.as_bytes()).into()))
            .collect();
        Self { digests }
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.digests.keys().map(String::as_str)
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, identifier: &str, secret: &str) -> Result<Option<String>, CredentialError> {
        let supplied: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Ok(self
            .digests
            .get(identifier)
            .filter(|expected| signatures_match(expected, &supplied))
            .map(|_| identifier.to_string()))
    }
}
