// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-call authorization input and the authenticated principal handed to
//! business handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use super::signature::SignedFields;

/// Everything the evaluator needs to decide one inbound request.
///
/// Built per call, never persisted. `principal` and `supplied_signature` are
/// optional only so that a caller bug can be reported as such; the evaluator
/// refuses to run without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Claimed principal id
    pub principal: Option<String>,
    /// Caller-supplied identifier of the request's resource/payload
    pub request_fingerprint: String,
    pub http_method: String,
    /// ISO-8601 date string, signed verbatim
    pub date_header: String,
    /// Transport-encoded signature
    pub supplied_signature: Option<String>,
    pub nonce: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(
        principal: impl Into<String>,
        request_fingerprint: impl Into<String>,
        http_method: impl Into<String>,
        date_header: impl Into<String>,
        supplied_signature: impl Into<String>,
        nonce: Option<String>,
    ) -> Self {
        Self {
            principal: Some(principal.into()),
            request_fingerprint: request_fingerprint.into(),
            http_method: http_method.into(),
            date_header: date_header.into(),
            supplied_signature: Some(supplied_signature.into()),
            nonce,
        }
    }

    /// The signed fields, if a nonce is present.
    pub fn signed_fields(&self) -> Option<SignedFields<'_>> {
        Some(SignedFields {
            fingerprint: &self.request_fingerprint,
            method: &self.http_method,
            date: &self.date_header,
            nonce: self.nonce.as_deref()?,
        })
    }
}

/// The principal a request was proven to come from.
///
/// Handlers receive this explicitly (see `auth::extractor::Signed`); nothing
/// reads the current principal from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedPrincipal {
    pub principal_id: String,
    /// Non-secret id of the session whose token signed the request
    pub session_id: String,
    /// Role stored with the principal at the time of the request
    pub role: Role,
    pub authenticated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_fields_require_nonce() {
        let mut request =
            AuthorizationRequest::new("p1", "/v1/whoami", "GET", "2024-01-01T00:00:00Z", "sig", None);
        assert!(request.signed_fields().is_none());

        request.nonce = Some("n-1".to_string());
        let fields = request.signed_fields().unwrap();
        assert_eq!(fields.fingerprint, "/v1/whoami");
        assert_eq!(fields.method, "GET");
        assert_eq!(fields.nonce, "n-1");
    }
}
