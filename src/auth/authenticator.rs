// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Glue between the pure evaluator and the stateful session lifecycle.
//!
//! Evaluate first, then (only on success) record the nonce and touch the
//! matched session. A denied request never mutates anything.

use chrono::Utc;

use super::error::AuthError;
use super::evaluator::{AuthorizationEvaluator, SessionMatch};
use super::replay::ReplayGuard;
use super::request::{AuthenticatedPrincipal, AuthorizationRequest};
use crate::session::SessionManager;

pub struct Authenticator {
    evaluator: AuthorizationEvaluator,
    sessions: SessionManager,
    replay: Option<ReplayGuard>,
}

impl Authenticator {
    pub fn new(
        evaluator: AuthorizationEvaluator,
        sessions: SessionManager,
        replay: Option<ReplayGuard>,
    ) -> Self {
        Self {
            evaluator,
            sessions,
            replay,
        }
    }

    /// Authenticate a request, refreshing the session that signed it.
    ///
    /// # Errors
    /// - [`AuthError::InvalidArgument`] on a caller contract violation
    /// - [`AuthError::AuthenticationFailure`] for every kind of denial
    pub fn authenticate(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let Some(SessionMatch { session, role }) = self.evaluator.evaluate(request)? else {
            return Err(AuthError::AuthenticationFailure);
        };
        let principal_id = request
            .principal
            .as_deref()
            .ok_or(AuthError::InvalidArgument("principal is required"))?;

        if let (Some(guard), Some(nonce)) = (&self.replay, request.nonce.as_deref()) {
            if !guard.check_and_record(principal_id, nonce) {
                tracing::warn!(principal_id = %principal_id, "Authorization denied: replayed nonce");
                return Err(AuthError::AuthenticationFailure);
            }
        }

        // Best-effort: the request is authorized even if the session was swept
        // between lookup and touch.
        match self.sessions.touch(principal_id, &session) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(session_id = %session.id, "Session vanished before touch");
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Failed to touch session");
            }
        }

        Ok(AuthenticatedPrincipal {
            principal_id: principal_id.to_string(),
            session_id: session.id,
            role,
            authenticated_at: Utc::now(),
        })
    }
}
