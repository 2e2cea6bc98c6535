// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session persistence boundary.
//!
//! The evaluator and lifecycle manager only ever talk to a [`SessionStore`];
//! they never touch a physical store directly. Implementations must give
//! per-record atomicity: a reader never observes a half-written session.

use chrono::{DateTime, Utc};

use super::models::{PrincipalRecord, Session};
use crate::auth::Role;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),

    #[error("session token already in use")]
    DuplicateToken,

    #[error("session id already in use: {0}")]
    DuplicateSession(String),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Principal and session persistence.
///
/// Every session operation is scoped to a principal id; there is deliberately
/// no lookup by bare token.
pub trait SessionStore: Send + Sync {
    /// Register a principal. Returns `false` if it already existed.
    fn register_principal(&self, principal_id: &str) -> StoreResult<bool>;

    /// Resolve a principal, its role and a snapshot of its live sessions.
    fn find_principal(&self, principal_id: &str) -> StoreResult<Option<PrincipalRecord>>;

    /// Replace a registered principal's role. New principals start as
    /// [`Role::Client`].
    fn set_role(&self, principal_id: &str, role: Role) -> StoreResult<()>;

    /// Delete a principal and every session it owns.
    ///
    /// Returns the number of sessions destroyed, or `None` if the principal
    /// did not exist.
    fn delete_principal(&self, principal_id: &str) -> StoreResult<Option<usize>>;

    /// Attach a new session to a registered principal.
    ///
    /// Fails with [`StoreError::DuplicateToken`] if any principal already holds
    /// the same token, [`StoreError::DuplicateSession`] if the session id is
    /// taken (by any principal), and [`StoreError::UnknownPrincipal`] if the
    /// principal is not registered. A failed insert changes nothing.
    fn insert_session(&self, principal_id: &str, session: &Session) -> StoreResult<()>;

    /// Move `last_accessed_at` forward to `at`. Never moves it backwards, so
    /// concurrent touches converge on the latest timestamp.
    ///
    /// Returns `false` if the session no longer exists.
    fn touch_session(
        &self,
        principal_id: &str,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Remove a single session. Returns `false` if it did not exist.
    fn remove_session(&self, principal_id: &str, session_id: &str) -> StoreResult<bool>;

    /// Remove every session whose `last_accessed_at` is before `cutoff`.
    fn remove_inactive(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    /// Cheap readiness check for health reporting.
    fn ping(&self) -> StoreResult<()>;
}

/// Behaviour every [`SessionStore`] implementation must share.
#[cfg(test)]
pub(crate) mod conformance {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::session::models::SessionToken;

    pub fn session(id: &str, token: &str, idle_minutes: i64) -> Session {
        let at = Utc::now() - Duration::minutes(idle_minutes);
        Session {
            id: id.to_string(),
            token: SessionToken::new(token),
            created_at: at,
            last_accessed_at: at,
        }
    }

    pub fn principal_lifecycle(store: &dyn SessionStore) {
        assert!(store.register_principal("alice").unwrap());
        assert!(!store.register_principal("alice").unwrap());

        let record = store.find_principal("alice").unwrap().unwrap();
        assert_eq!(record.id, "alice");
        assert!(record.sessions.is_empty());

        assert!(store.find_principal("bob").unwrap().is_none());
    }

    pub fn sessions_are_scoped_to_their_principal(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.register_principal("bob").unwrap();
        store
            .insert_session("alice", &session("s1", "tok-alice", 0))
            .unwrap();

        let bob = store.find_principal("bob").unwrap().unwrap();
        assert!(bob.sessions.is_empty());

        // Bob cannot touch or remove Alice's session by id.
        assert!(!store.touch_session("bob", "s1", Utc::now()).unwrap());
        assert!(!store.remove_session("bob", "s1").unwrap());
        assert_eq!(store.find_principal("alice").unwrap().unwrap().sessions.len(), 1);
    }

    pub fn tokens_are_globally_unique(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.register_principal("bob").unwrap();
        store
            .insert_session("alice", &session("s1", "shared", 0))
            .unwrap();

        let err = store
            .insert_session("bob", &session("s2", "shared", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateToken));
        assert!(store.find_principal("bob").unwrap().unwrap().sessions.is_empty());
    }

    pub fn session_ids_are_globally_unique(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.register_principal("bob").unwrap();
        let original = session("s1", "tok-alice", 0);
        store.insert_session("alice", &original).unwrap();

        let err = store
            .insert_session("bob", &session("s1", "tok-bob", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession(id) if id == "s1"));
        let err = store
            .insert_session("alice", &session("s1", "tok-other", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession(_)));

        // Alice keeps her session and Bob gets nothing.
        assert_eq!(
            store.find_principal("alice").unwrap().unwrap().sessions,
            vec![original]
        );
        assert!(store.find_principal("bob").unwrap().unwrap().sessions.is_empty());
        assert!(store.touch_session("alice", "s1", Utc::now()).unwrap());

        // The rejected tokens were not reserved.
        store.insert_session("bob", &session("s2", "tok-bob", 0)).unwrap();
    }

    pub fn roles_are_stored_with_the_principal(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        assert_eq!(store.find_principal("alice").unwrap().unwrap().role, Role::Client);

        store.set_role("alice", Role::Admin).unwrap();
        store.insert_session("alice", &session("s1", "t1", 0)).unwrap();
        let record = store.find_principal("alice").unwrap().unwrap();
        assert_eq!(record.role, Role::Admin);
        assert_eq!(record.sessions.len(), 1);

        // Re-registering an existing principal keeps its role.
        assert!(!store.register_principal("alice").unwrap());
        assert_eq!(store.find_principal("alice").unwrap().unwrap().role, Role::Admin);

        let err = store.set_role("ghost", Role::Admin).unwrap_err();
        assert!(matches!(err, StoreError::UnknownPrincipal(id) if id == "ghost"));

        // Deleting the principal drops the role with it.
        store.delete_principal("alice").unwrap();
        store.register_principal("alice").unwrap();
        assert_eq!(store.find_principal("alice").unwrap().unwrap().role, Role::Client);
    }

    pub fn ping_succeeds(store: &dyn SessionStore) {
        store.ping().unwrap();
        store.register_principal("alice").unwrap();
        store.ping().unwrap();
    }

    pub fn insert_requires_registered_principal(store: &dyn SessionStore) {
        let err = store
            .insert_session("ghost", &session("s1", "tok", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownPrincipal(id) if id == "ghost"));
    }

    pub fn touch_only_moves_forward(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        let s = session("s1", "tok", 30);
        store.insert_session("alice", &s).unwrap();

        let later = Utc::now();
        assert!(store.touch_session("alice", "s1", later).unwrap());
        assert!(store
            .touch_session("alice", "s1", later - Duration::minutes(10))
            .unwrap());

        let record = store.find_principal("alice").unwrap().unwrap();
        assert_eq!(record.sessions[0].last_accessed_at, later);
        assert_eq!(record.sessions[0].created_at, s.created_at);

        assert!(!store.touch_session("alice", "missing", later).unwrap());
    }

    pub fn remove_inactive_counts_removed(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.register_principal("bob").unwrap();
        store.insert_session("alice", &session("a1", "t1", 5)).unwrap();
        store.insert_session("alice", &session("a2", "t2", 65)).unwrap();
        store.insert_session("bob", &session("b1", "t3", 120)).unwrap();

        let removed = store
            .remove_inactive(Utc::now() - Duration::minutes(60))
            .unwrap();
        assert_eq!(removed, 2);

        let alice = store.find_principal("alice").unwrap().unwrap();
        assert_eq!(alice.sessions.len(), 1);
        assert_eq!(alice.sessions[0].id, "a1");
        // The principal survives losing all its sessions.
        assert!(store.find_principal("bob").unwrap().unwrap().sessions.is_empty());

        // Expired tokens are free again.
        store.insert_session("bob", &session("b2", "t3", 0)).unwrap();

        assert_eq!(
            store.remove_inactive(Utc::now() - Duration::minutes(60)).unwrap(),
            0
        );
    }

    pub fn delete_principal_destroys_sessions(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.insert_session("alice", &session("a1", "t1", 0)).unwrap();
        store.insert_session("alice", &session("a2", "t2", 0)).unwrap();

        assert_eq!(store.delete_principal("alice").unwrap(), Some(2));
        assert!(store.find_principal("alice").unwrap().is_none());
        assert_eq!(store.delete_principal("alice").unwrap(), None);

        // Re-registering starts from an empty session set.
        store.register_principal("alice").unwrap();
        assert!(store.find_principal("alice").unwrap().unwrap().sessions.is_empty());
        store.insert_session("alice", &session("a3", "t1", 0)).unwrap();
    }

    pub fn remove_session_is_idempotent(store: &dyn SessionStore) {
        store.register_principal("alice").unwrap();
        store.insert_session("alice", &session("a1", "t1", 0)).unwrap();

        assert!(store.remove_session("alice", "a1").unwrap());
        assert!(!store.remove_session("alice", "a1").unwrap());
        assert!(store.find_principal("alice").unwrap().unwrap().sessions.is_empty());
    }
}
