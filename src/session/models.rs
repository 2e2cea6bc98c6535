// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session and principal records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Opaque per-login secret used as signing material.
///
/// `Debug` is redacted so tokens never end up in logs by accident.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A live login session owned by exactly one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Non-secret identifier (used for listing, revoking, logging)
    pub id: String,
    /// Secret signing material, never sent on the wire after login
    pub token: SessionToken,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successfully authorized request
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has been idle since before `cutoff`.
    pub fn is_inactive_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_accessed_at < cutoff
    }
}

/// A principal together with its role and currently live sessions.
///
/// This is a snapshot: later store mutations are not reflected in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalRecord {
    pub id: String,
    pub role: Role,
    /// Ordered oldest first by `created_at`
    pub sessions: Vec<Session>,
}

impl PrincipalRecord {
    pub fn new(id: impl Into<String>, mut sessions: Vec<Session>) -> Self {
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Self {
            id: id.into(),
            role: Role::default(),
            sessions,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn most_recent_session(&self) -> Option<&Session> {
        self.sessions.last()
    }
}
