// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory session store.
//!
//! Used when no `DATA_DIR` is configured and in tests. Sessions are lost on
//! restart, which simply forces every client to log in again.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::models::{PrincipalRecord, Session, SessionToken};
use super::store::{SessionStore, StoreError, StoreResult};
use crate::auth::Role;

#[derive(Default)]
struct PrincipalEntry {
    role: Role,
    /// session_id → session
    sessions: HashMap<String, Session>,
}

#[derive(Default)]
struct Inner {
    principals: HashMap<String, PrincipalEntry>,
    /// Global token index for the uniqueness invariant
    token_owners: HashMap<SessionToken, String>,
}

/// `RwLock`-guarded maps; every operation holds the lock for its whole
/// duration, so readers only ever see complete records.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Inner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn register_principal(&self, principal_id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.principals.contains_key(principal_id) {
            return Ok(false);
        }
        inner
            .principals
            .insert(principal_id.to_string(), PrincipalEntry::default());
        Ok(true)
    }

    fn find_principal(&self, principal_id: &str) -> StoreResult<Option<PrincipalRecord>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.principals.get(principal_id).map(|entry| {
            PrincipalRecord::new(principal_id, entry.sessions.values().cloned().collect())
                .with_role(entry.role)
        }))
    }

    fn set_role(&self, principal_id: &str, role: Role) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = inner
            .principals
            .get_mut(principal_id)
            .ok_or_else(|| StoreError::UnknownPrincipal(principal_id.to_string()))?;
        entry.role = role;
        Ok(())
    }

    fn delete_principal(&self, principal_id: &str) -> StoreResult<Option<usize>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = inner.principals.remove(principal_id) else {
            return Ok(None);
        };
        for session in entry.sessions.values() {
            inner.token_owners.remove(&session.token);
        }
        Ok(Some(entry.sessions.len()))
    }

    fn insert_session(&self, principal_id: &str, session: &Session) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.token_owners.contains_key(&session.token) {
            return Err(StoreError::DuplicateToken);
        }
        if inner
            .principals
            .values()
            .any(|entry| entry.sessions.contains_key(&session.id))
        {
            return Err(StoreError::DuplicateSession(session.id.clone()));
        }
        let entry = inner
            .principals
            .get_mut(principal_id)
            .ok_or_else(|| StoreError::UnknownPrincipal(principal_id.to_string()))?;
        entry.sessions.insert(session.id.clone(), session.clone());
        inner
            .token_owners
            .insert(session.token.clone(), principal_id.to_string());
        Ok(())
    }

    fn touch_session(
        &self,
        principal_id: &str,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let session = inner
            .principals
            .get_mut(principal_id)
            .and_then(|entry| entry.sessions.get_mut(session_id));
        match session {
            Some(session) => {
                if at > session.last_accessed_at {
                    session.last_accessed_at = at;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_session(&self, principal_id: &str, session_id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner
            .principals
            .get_mut(principal_id)
            .and_then(|entry| entry.sessions.remove(session_id));
        match removed {
            Some(session) => {
                inner.token_owners.remove(&session.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_inactive(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut expired = Vec::new();
        for entry in inner.principals.values_mut() {
            entry.sessions.retain(|_, session| {
                if session.is_inactive_since(cutoff) {
                    expired.push(session.token.clone());
                    false
                } else {
                    true
                }
            });
        }
        for token in &expired {
            inner.token_owners.remove(token);
        }
        Ok(expired.len())
    }

    fn ping(&self) -> StoreResult<()> {
        let _inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(())
    }
}
