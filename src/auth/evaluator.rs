// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization evaluator.
//!
//! ## Validation Sequence
//!
//! 1. `principal` and `supplied_signature` must be present, otherwise
//!    [`AuthError::InvalidArgument`] (a caller bug, never a denial)
//! 2. Resolve the claimed principal's live sessions (and nothing else)
//! 3. Require a nonce; optionally require the date to be within the
//!    configured clock skew
//! 4. Decode the supplied signature and compare it against the signature
//!    recomputed with each candidate session token
//!
//! Every failure after step 1 folds into "not authorized". The evaluator is a
//! pure decision over a snapshot of the principal record: it never touches
//! sessions, so a failed request leaves no trace in the store.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::codec::decode_signature;
use super::error::{AuthError, ParseVariantError};
use super::request::AuthorizationRequest;
use super::roles::Role;
use super::signature::{signatures_match, SignatureScheme};
use crate::session::{Session, SessionStore};

/// Which of a principal's live sessions may authorize a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionScope {
    /// Any live session (multi-device login)
    #[default]
    AllLive,
    /// Only the most recently created session
    MostRecent,
}

impl FromStr for SessionScope {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "all-live" => Ok(Self::AllLive),
            "latest" | "most-recent" => Ok(Self::MostRecent),
            _ => Err(ParseVariantError::new("session scope", s)),
        }
    }
}

/// Whether the signed date header is checked against server time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// The date is only signed material
    #[default]
    Unchecked,
    /// Reject dates further than this from server time (either direction)
    MaxSkew(Duration),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluatorConfig {
    pub scheme: SignatureScheme,
    pub scope: SessionScope,
    pub date_policy: DatePolicy,
}

/// Parse a request date: RFC 3339, or ISO-8601 with a `+hhmm` offset.
pub fn parse_request_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// The session whose token signed a request, and its principal's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMatch {
    pub session: Session,
    pub role: Role,
}

pub struct AuthorizationEvaluator {
    store: Arc<dyn SessionStore>,
    config: EvaluatorConfig,
}

impl AuthorizationEvaluator {
    pub fn new(store: Arc<dyn SessionStore>, config: EvaluatorConfig) -> Self {
        Self { store, config }
    }

    /// Decide whether the request is authentic.
    ///
    /// # Errors
    /// Only [`AuthError::InvalidArgument`]; every other failure is `Ok(false)`.
    pub fn is_authorized(&self, request: &AuthorizationRequest) -> Result<bool, AuthError> {
        Ok(self.evaluate(request)?.is_some())
    }

    /// Like [`is_authorized`](Self::is_authorized), returning the session whose
    /// token produced the matching signature.
    pub fn evaluate(&self, request: &AuthorizationRequest) -> Result<Option<SessionMatch>, AuthError> {
        self.evaluate_at(request, Utc::now())
    }

    pub(crate) fn evaluate_at(
        &self,
        request: &AuthorizationRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionMatch>, AuthError> {
        let principal_id = request
            .principal
            .as_deref()
            .ok_or(AuthError::InvalidArgument("principal is required"))?;
        let supplied = request
            .supplied_signature
            .as_deref()
            .ok_or(AuthError::InvalidArgument("supplied signature is required"))?;

        let record = match self.store.find_principal(principal_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(principal_id = %principal_id, "Authorization denied: unknown principal");
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(principal_id = %principal_id, error = %e, "Session lookup failed");
                return Ok(None);
            }
        };

        let Some(fields) = request.signed_fields() else {
            tracing::debug!(principal_id = %principal_id, "Authorization denied: missing nonce");
            return Ok(None);
        };

        if let DatePolicy::MaxSkew(max_skew) = self.config.date_policy {
            let fresh = parse_request_date(fields.date)
                .map(|date| (now - date).abs() <= max_skew)
                .unwrap_or(false);
            if !fresh {
                tracing::debug!(principal_id = %principal_id, "Authorization denied: stale or invalid date");
                return Ok(None);
            }
        }

        let Some(supplied) = decode_signature(supplied) else {
            tracing::debug!(principal_id = %principal_id, "Authorization denied: undecodable signature");
            return Ok(None);
        };

        let candidates: Vec<&Session> = match self.config.scope {
            SessionScope::AllLive => record.sessions.iter().collect(),
            SessionScope::MostRecent => record.most_recent_session().into_iter().collect(),
        };

        let matched = candidates.into_iter().find(|session| {
            let expected = self.config.scheme.sign(session.token.as_str(), fields);
            signatures_match(&expected, &supplied)
        });

        if matched.is_none() {
            tracing::debug!(
                principal_id = %principal_id,
                live_sessions = record.sessions.len(),
                "Authorization denied: no session signature matched"
            );
        }
        Ok(matched.map(|session| SessionMatch {
            session: session.clone(),
            role: record.role,
        }))
    }
}
