// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded session database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `principals`: principal_id → registration time (unix millis)
//! - `principal_roles`: principal_id → role name (absent means client)
//! - `sessions`: session_id → serialized StoredSession (JSON bytes)
//! - `principal_sessions`: composite key (len|principal_id|session_id) → ()
//! - `session_tokens`: token → session_id (global uniqueness index)
//!
//! Every mutation runs in a single write transaction, and reads run against an
//! MVCC snapshot, so an inactivity sweep never observes a half-written record.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use serde::{Deserialize, Serialize};

use super::models::{PrincipalRecord, Session};
use super::store::{SessionStore, StoreError, StoreResult};
use crate::auth::Role;

// =============================================================================
// Table Definitions
// =============================================================================

const PRINCIPALS: TableDefinition<&str, i64> = TableDefinition::new("principals");

const PRINCIPAL_ROLES: TableDefinition<&str, &str> = TableDefinition::new("principal_roles");

const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Key format: `u32_be(len(principal_id)) | principal_id | session_id`.
/// The length prefix keeps principal ids from bleeding into each other's ranges.
const PRINCIPAL_SESSIONS: TableDefinition<&[u8], ()> = TableDefinition::new("principal_sessions");

const SESSION_TOKENS: TableDefinition<&str, &str> = TableDefinition::new("session_tokens");

#[derive(Serialize, Deserialize)]
struct StoredSession {
    principal_id: String,
    session: Session,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

fn make_prefix(principal_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + principal_id.len());
    prefix.extend_from_slice(&(principal_id.len() as u32).to_be_bytes());
    prefix.extend_from_slice(principal_id.as_bytes());
    prefix
}

fn make_index_key(principal_id: &str, session_id: &str) -> Vec<u8> {
    let mut key = make_prefix(principal_id);
    key.extend_from_slice(session_id.as_bytes());
    key
}

/// Upper bound for a prefix scan. Session ids are ASCII, so a trailing 0xFF
/// sorts after every key carrying this prefix.
fn make_prefix_end(principal_id: &str) -> Vec<u8> {
    let mut end = make_prefix(principal_id);
    end.push(0xFF);
    end
}

fn session_ids_for(
    index: &impl ReadableTable<&'static [u8], ()>,
    principal_id: &str,
) -> StoreResult<Vec<String>> {
    let prefix = make_prefix(principal_id);
    let prefix_end = make_prefix_end(principal_id);

    let mut ids = Vec::new();
    for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
        let (key, _) = entry?;
        if let Ok(id) = std::str::from_utf8(&key.value()[prefix.len()..]) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// An unreadable role name degrades to the least-privileged role.
fn read_role(
    roles: &impl ReadableTable<&'static str, &'static str>,
    principal_id: &str,
) -> StoreResult<Role> {
    Ok(roles
        .get(principal_id)?
        .and_then(|value| value.value().parse().ok())
        .unwrap_or_default())
}

fn read_session(
    sessions: &impl ReadableTable<&'static str, &'static [u8]>,
    session_id: &str,
) -> StoreResult<Option<StoredSession>> {
    match sessions.get(session_id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Remove a session and both of its index entries inside an open write.
fn purge_session(
    sessions: &mut Table<'_, &'static str, &'static [u8]>,
    index: &mut Table<'_, &'static [u8], ()>,
    tokens: &mut Table<'_, &'static str, &'static str>,
    stored: &StoredSession,
) -> StoreResult<()> {
    sessions.remove(stored.session.id.as_str())?;
    index.remove(make_index_key(&stored.principal_id, &stored.session.id).as_slice())?;
    tokens.remove(stored.session.token.as_str())?;
    Ok(())
}

// =============================================================================
// RedbSessionStore
// =============================================================================

pub struct RedbSessionStore {
    db: Database,
}

impl RedbSessionStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRINCIPALS)?;
            let _ = write_txn.open_table(PRINCIPAL_ROLES)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(PRINCIPAL_SESSIONS)?;
            let _ = write_txn.open_table(SESSION_TOKENS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl SessionStore for RedbSessionStore {
    fn register_principal(&self, principal_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let created = {
            let mut table = write_txn.open_table(PRINCIPALS)?;
            let exists = table.get(principal_id)?.is_some();
            if !exists {
                table.insert(principal_id, Utc::now().timestamp_millis())?;
            }
            !exists
        };
        write_txn.commit()?;
        Ok(created)
    }

    fn find_principal(&self, principal_id: &str) -> StoreResult<Option<PrincipalRecord>> {
        let read_txn = self.db.begin_read()?;
        let principals = read_txn.open_table(PRINCIPALS)?;
        if principals.get(principal_id)?.is_none() {
            return Ok(None);
        }

        let role = read_role(&read_txn.open_table(PRINCIPAL_ROLES)?, principal_id)?;
        let index = read_txn.open_table(PRINCIPAL_SESSIONS)?;
        let sessions = read_txn.open_table(SESSIONS)?;

        let mut live = Vec::new();
        for session_id in session_ids_for(&index, principal_id)? {
            if let Some(stored) = read_session(&sessions, &session_id)? {
                live.push(stored.session);
            }
        }
        Ok(Some(PrincipalRecord::new(principal_id, live).with_role(role)))
    }

    fn set_role(&self, principal_id: &str, role: Role) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let principals = write_txn.open_table(PRINCIPALS)?;
            if principals.get(principal_id)?.is_none() {
                return Err(StoreError::UnknownPrincipal(principal_id.to_string()));
            }
            let mut roles = write_txn.open_table(PRINCIPAL_ROLES)?;
            roles.insert(principal_id, role.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete_principal(&self, principal_id: &str) -> StoreResult<Option<usize>> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut principals = write_txn.open_table(PRINCIPALS)?;
            let existed = principals.remove(principal_id)?.is_some();
            if existed {
                let mut roles = write_txn.open_table(PRINCIPAL_ROLES)?;
                roles.remove(principal_id)?;
                let mut sessions = write_txn.open_table(SESSIONS)?;
                let mut index = write_txn.open_table(PRINCIPAL_SESSIONS)?;
                let mut tokens = write_txn.open_table(SESSION_TOKENS)?;

                let mut count = 0;
                for session_id in session_ids_for(&index, principal_id)? {
                    if let Some(stored) = read_session(&sessions, &session_id)? {
                        purge_session(&mut sessions, &mut index, &mut tokens, &stored)?;
                        count += 1;
                    }
                }
                Some(count)
            } else {
                None
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn insert_session(&self, principal_id: &str, session: &Session) -> StoreResult<()> {
        let json = serde_json::to_vec(&StoredSession {
            principal_id: principal_id.to_string(),
            session: session.clone(),
        })?;

        let write_txn = self.db.begin_write()?;
        {
            let principals = write_txn.open_table(PRINCIPALS)?;
            if principals.get(principal_id)?.is_none() {
                return Err(StoreError::UnknownPrincipal(principal_id.to_string()));
            }

            let mut tokens = write_txn.open_table(SESSION_TOKENS)?;
            if tokens.get(session.token.as_str())?.is_some() {
                return Err(StoreError::DuplicateToken);
            }
            let mut sessions = write_txn.open_table(SESSIONS)?;
            if sessions.get(session.id.as_str())?.is_some() {
                return Err(StoreError::DuplicateSession(session.id.clone()));
            }

            tokens.insert(session.token.as_str(), session.id.as_str())?;
            sessions.insert(session.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(PRINCIPAL_SESSIONS)?;
            index.insert(make_index_key(principal_id, &session.id).as_slice(), ())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn touch_session(
        &self,
        principal_id: &str,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let touched = {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            match read_session(&sessions, session_id)? {
                Some(mut stored) if stored.principal_id == principal_id => {
                    if at > stored.session.last_accessed_at {
                        stored.session.last_accessed_at = at;
                        let json = serde_json::to_vec(&stored)?;
                        sessions.insert(session_id, json.as_slice())?;
                    }
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(touched)
    }

    fn remove_session(&self, principal_id: &str, session_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            match read_session(&sessions, session_id)? {
                Some(stored) if stored.principal_id == principal_id => {
                    let mut index = write_txn.open_table(PRINCIPAL_SESSIONS)?;
                    let mut tokens = write_txn.open_table(SESSION_TOKENS)?;
                    purge_session(&mut sessions, &mut index, &mut tokens, &stored)?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn remove_inactive(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            let mut index = write_txn.open_table(PRINCIPAL_SESSIONS)?;
            let mut tokens = write_txn.open_table(SESSION_TOKENS)?;

            // Full scan: last_accessed_at moves on every authorized request, so
            // an ordered expiry index would cost a rewrite per touch.
            let mut expired = Vec::new();
            for entry in sessions.iter()? {
                let (_, value) = entry?;
                let stored: StoredSession = serde_json::from_slice(value.value())?;
                if stored.session.is_inactive_since(cutoff) {
                    expired.push(stored);
                }
            }

            for stored in &expired {
                purge_session(&mut sessions, &mut index, &mut tokens, stored)?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(PRINCIPALS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::conformance;
    use tempfile::TempDir;

    fn setup_store() -> (RedbSessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbSessionStore::open(&temp_dir.path().join("sessions.redb")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn principal_lifecycle() {
        let (store, _temp) = setup_store();
        conformance::principal_lifecycle(&store);
    }

    #[test]
    fn sessions_are_scoped_to_their_principal() {
        let (store, _temp) = setup_store();
        conformance::sessions_are_scoped_to_their_principal(&store);
    }

    #[test]
    fn tokens_are_globally_unique() {
        let (store, _temp) = setup_store();
        conformance::tokens_are_globally_unique(&store);
    }

    #[test]
    fn session_ids_are_globally_unique() {
        let (store, _temp) = setup_store();
        conformance::session_ids_are_globally_unique(&store);
    }

    #[test]
    fn insert_requires_registered_principal() {
        let (store, _temp) = setup_store();
        conformance::insert_requires_registered_principal(&store);
    }

    #[test]
    fn roles_are_stored_with_the_principal() {
        let (store, _temp) = setup_store();
        conformance::roles_are_stored_with_the_principal(&store);
    }

    #[test]
    fn ping_succeeds() {
        let (store, _temp) = setup_store();
        conformance::ping_succeeds(&store);
    }

    #[test]
    fn touch_only_moves_forward() {
        let (store, _temp) = setup_store();
        conformance::touch_only_moves_forward(&store);
    }

    #[test]
    fn remove_inactive_counts_removed() {
        let (store, _temp) = setup_store();
        conformance::remove_inactive_counts_removed(&store);
    }

    #[test]
    fn delete_principal_destroys_sessions() {
        let (store, _temp) = setup_store();
        conformance::delete_principal_destroys_sessions(&store);
    }

    #[test]
    fn remove_session_is_idempotent() {
        let (store, _temp) = setup_store();
        conformance::remove_session_is_idempotent(&store);
    }

    #[test]
    fn prefix_ranges_do_not_overlap() {
        let (store, _temp) = setup_store();
        store.register_principal("ab").unwrap();
        store.register_principal("abc").unwrap();
        store
            .insert_session("abc", &conformance::session("s1", "t1", 0))
            .unwrap();

        assert!(store.find_principal("ab").unwrap().unwrap().sessions.is_empty());
        assert_eq!(store.find_principal("abc").unwrap().unwrap().sessions.len(), 1);
    }

    #[test]
    fn sessions_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sessions.redb");
        {
            let store = RedbSessionStore::open(&path).unwrap();
            store.register_principal("alice").unwrap();
            store.set_role("alice", Role::Support).unwrap();
            store
                .insert_session("alice", &conformance::session("s1", "t1", 0))
                .unwrap();
        }

        let store = RedbSessionStore::open(&path).unwrap();
        let record = store.find_principal("alice").unwrap().unwrap();
        assert_eq!(record.sessions.len(), 1);
        assert_eq!(record.sessions[0].token.as_str(), "t1");
        assert_eq!(record.role, Role::Support);
    }
}
