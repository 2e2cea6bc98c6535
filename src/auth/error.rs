// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication and authorization error type.
///
/// `AuthenticationFailure` deliberately carries no detail: callers must not
/// learn which check (principal, session, nonce, signature) failed.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format or missing signed headers
    InvalidAuthHeader,
    /// Caller contract violation (missing principal or signature)
    InvalidArgument(&'static str),
    /// The request could not be authenticated
    AuthenticationFailure,
    /// Authenticated, but not allowed to act on this resource
    AuthorizationFailure(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidArgument(_) => "invalid_argument",
            AuthError::AuthenticationFailure => "authentication_failed",
            AuthError::AuthorizationFailure(_) => "not_authorized",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            AuthError::AuthorizationFailure(_) => StatusCode::FORBIDDEN,
            AuthError::InvalidArgument(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => write!(
                f,
                "Invalid authorization headers (expected 'Authorization: <principal>:<signature>', \
                 'x-auth-date' and 'x-auth-nonce')"
            ),
            AuthError::InvalidArgument(what) => write!(f, "Invalid argument: {what}"),
            AuthError::AuthenticationFailure => write!(f, "Authentication failed"),
            AuthError::AuthorizationFailure(msg) => write!(f, "Not authorized: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// A configuration string that names none of an enum's variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseVariantError {
    kind: &'static str,
    value: String,
}

impl ParseVariantError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication fault");
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
