// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session lifecycle: creation, touch, inactivity expiry and invalidation.
//!
//! ```text
//! Created ──▶ Active ──▶ Expired      (inactivity sweep)
//!               ▲  │
//!          touch└──┘ ──▶ Invalidated  (logout, principal deleted)
//! ```
//!
//! Expired and invalidated sessions are gone for good; a new login always
//! creates a fresh session with a fresh token.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ring::rand::SystemRandom;
use uuid::Uuid;

use super::models::Session;
use super::store::{SessionStore, StoreError};
use super::token::{generate_session_token, EntropyError};
use crate::auth::Role;

/// Fresh ids and tokens are retried this many times on an (astronomically
/// unlikely) uniqueness collision before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("store error: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),

    #[error("inactivity window must be at least one minute")]
    InvalidWindow,

    #[error("could not allocate a unique session id and token")]
    TokenCollision,
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownPrincipal(id) => SessionError::UnknownPrincipal(id),
            other => SessionError::Store(other),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    rng: SystemRandom,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            rng: SystemRandom::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Ensure a principal exists. Returns `true` if it was newly registered.
    pub fn register_principal(&self, principal_id: &str) -> SessionResult<bool> {
        Ok(self.store.register_principal(principal_id)?)
    }

    /// Replace a registered principal's role.
    pub fn assign_role(&self, principal_id: &str, role: Role) -> SessionResult<()> {
        self.store.set_role(principal_id, role)?;
        tracing::info!(principal_id = %principal_id, role = %role, "Assigned role");
        Ok(())
    }

    /// Create and persist a new session for a registered principal.
    pub fn create_session(&self, principal_id: &str) -> SessionResult<Session> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let now = Utc::now();
            let session = Session {
                id: Uuid::new_v4().to_string(),
                token: generate_session_token(&self.rng)?,
                created_at: now,
                last_accessed_at: now,
            };

            match self.store.insert_session(principal_id, &session) {
                Ok(()) => {
                    tracing::debug!(
                        principal_id = %principal_id,
                        session_id = %session.id,
                        "Created session"
                    );
                    return Ok(session);
                }
                Err(e @ (StoreError::DuplicateToken | StoreError::DuplicateSession(_))) => {
                    tracing::warn!(principal_id = %principal_id, error = %e, "Session collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SessionError::TokenCollision)
    }

    /// Refresh `last_accessed_at` after a successful authorization.
    ///
    /// Returns `false` if the session disappeared in the meantime (expired or
    /// invalidated); the request that was already authorized still stands.
    pub fn touch(&self, principal_id: &str, session: &Session) -> SessionResult<bool> {
        self.touch_at(principal_id, session, Utc::now())
    }

    pub(crate) fn touch_at(
        &self,
        principal_id: &str,
        session: &Session,
        at: DateTime<Utc>,
    ) -> SessionResult<bool> {
        Ok(self.store.touch_session(principal_id, &session.id, at)?)
    }

    /// Delete every session idle for longer than `max_inactivity_minutes`.
    ///
    /// Returns the number of sessions removed.
    pub fn expire_inactive(&self, max_inactivity_minutes: u32) -> SessionResult<usize> {
        self.expire_inactive_at(max_inactivity_minutes, Utc::now())
    }

    pub(crate) fn expire_inactive_at(
        &self,
        max_inactivity_minutes: u32,
        now: DateTime<Utc>,
    ) -> SessionResult<usize> {
        if max_inactivity_minutes == 0 {
            return Err(SessionError::InvalidWindow);
        }
        let cutoff = now - Duration::minutes(i64::from(max_inactivity_minutes));
        let removed = self.store.remove_inactive(cutoff)?;
        if removed > 0 {
            tracing::info!(count = removed, "Expired inactive sessions");
        }
        Ok(removed)
    }

    /// Invalidate one session (logout).
    pub fn invalidate(&self, principal_id: &str, session_id: &str) -> SessionResult<bool> {
        let removed = self.store.remove_session(principal_id, session_id)?;
        if removed {
            tracing::debug!(principal_id = %principal_id, session_id = %session_id, "Invalidated session");
        }
        Ok(removed)
    }

    /// Invalidate every session of a principal (logout everywhere).
    pub fn invalidate_all(&self, principal_id: &str) -> SessionResult<usize> {
        let Some(record) = self.store.find_principal(principal_id)? else {
            return Err(SessionError::UnknownPrincipal(principal_id.to_string()));
        };
        let mut removed = 0;
        for session in &record.sessions {
            if self.store.remove_session(principal_id, &session.id)? {
                removed += 1;
            }
        }
        tracing::debug!(principal_id = %principal_id, count = removed, "Invalidated all sessions");
        Ok(removed)
    }

    /// Delete a principal together with all of its sessions.
    pub fn delete_principal(&self, principal_id: &str) -> SessionResult<usize> {
        match self.store.delete_principal(principal_id)? {
            Some(count) => {
                tracing::info!(principal_id = %principal_id, sessions = count, "Deleted principal");
                Ok(count)
            }
            None => Err(SessionError::UnknownPrincipal(principal_id.to_string())),
        }
    }

    /// Live sessions of a principal, oldest first.
    pub fn list_sessions(&self, principal_id: &str) -> SessionResult<Vec<Session>> {
        self.store
            .find_principal(principal_id)?
            .map(|record| record.sessions)
            .ok_or_else(|| SessionError::UnknownPrincipal(principal_id.to_string()))
    }
}
