// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! ## Model Categories
//!
//! - **Login**: credential and social-provider logins, and the one-time
//!   session token handed back
//! - **Sessions**: non-secret session listings
//! - **Principals**: identity and deletion results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

use crate::session::Session;

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SocialLoginRequest {
    /// Access token issued by the social provider
    pub access_token: String,
}

/// Result of a successful login.
///
/// `session_token` is returned exactly once. The client keeps it secret and
/// uses it to sign every later request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub principal_id: String,
    pub session_id: String,
    pub session_token: String,
    pub created_at: DateTime<Utc>,
}

impl LoginResponse {
    pub fn new(principal_id: impl Into<String>, session: Session) -> Self {
        Self {
            principal_id: principal_id.into(),
            session_id: session.id,
            session_token: session.token.as_str().to_string(),
            created_at: session.created_at,
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// A session without its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            created_at: session.created_at,
            last_accessed_at: session.last_accessed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub principal_id: String,
    /// Oldest first
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct LogoutQuery {
    /// Also end every other session of the principal
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionsRemovedResponse {
    pub principal_id: String,
    pub sessions_removed: usize,
}

// =============================================================================
// Principals
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WhoAmIResponse {
    pub principal_id: String,
    pub session_id: String,
    pub role: Role,
    pub authenticated_at: DateTime<Utc>,
}
