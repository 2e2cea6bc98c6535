// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for signed requests.
//!
//! Use the `Signed` extractor in handlers to require a valid request
//! signature:
//!
//! ```rust,ignore
//! async fn my_handler(Signed(principal): Signed) -> impl IntoResponse {
//!     // principal is AuthenticatedPrincipal
//! }
//! ```
//!
//! ## Wire Format
//!
//! | Header          | Value                                   |
//! |-----------------|-----------------------------------------|
//! | `Authorization` | `<principal_id>:<base64 signature>`     |
//! | `x-auth-date`   | ISO-8601 date, signed verbatim          |
//! | `x-auth-nonce`  | Per-request unique value                |
//!
//! The request fingerprint is the request target (path plus query) exactly
//! as the client sent it.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header::AUTHORIZATION, request::Parts, HeaderName, Uri},
};

use super::codec::AuthorizationHeader;
use super::request::{AuthenticatedPrincipal, AuthorizationRequest};
use super::AuthError;
use crate::state::AppState;

pub const DATE_HEADER: HeaderName = HeaderName::from_static("x-auth-date");
pub const NONCE_HEADER: HeaderName = HeaderName::from_static("x-auth-nonce");

/// Extractor for requests signed with a live session token.
///
/// On success the signing session's last-access time has been refreshed.
pub struct Signed(pub AuthenticatedPrincipal);

impl FromRequestParts<AppState> for Signed {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let request = authorization_request(parts)?;
        let principal = state.authenticator.authenticate(&request)?;
        Ok(Signed(principal))
    }
}

/// Build the evaluator input from request headers.
pub fn authorization_request(parts: &Parts) -> Result<AuthorizationRequest, AuthError> {
    let auth_value = header_str(parts, &AUTHORIZATION)?.ok_or(AuthError::MissingAuthHeader)?;
    let header = AuthorizationHeader::parse(auth_value).ok_or(AuthError::InvalidAuthHeader)?;
    let date = header_str(parts, &DATE_HEADER)?.ok_or(AuthError::InvalidAuthHeader)?;
    let nonce = header_str(parts, &NONCE_HEADER)?.ok_or(AuthError::InvalidAuthHeader)?;

    // Nested routers rewrite `parts.uri`; the client signed the original.
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);

    Ok(AuthorizationRequest::new(
        header.principal_id,
        request_fingerprint(uri),
        parts.method.as_str(),
        date,
        header.signature,
        Some(nonce.to_string()),
    ))
}

/// Path and query of a request target.
pub fn request_fingerprint(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

fn header_str<'a>(parts: &'a Parts, name: &HeaderName) -> Result<Option<&'a str>, AuthError> {
    parts
        .headers
        .get(name)
        .map(|v| v.to_str().map_err(|_| AuthError::InvalidAuthHeader))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::auth::codec::encode_signature;
    use crate::auth::signature::sign;

    const DATE: &str = "2024-05-01T09:30:00.000Z";

    fn parts_for(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn signed_builder(
        principal: &str,
        token: &str,
        method: &str,
        target: &str,
        nonce: &str,
    ) -> axum::http::request::Builder {
        let sig = encode_signature(&sign(token, target, method, DATE, nonce));
        Request::builder()
            .method(method)
            .uri(target)
            .header(AUTHORIZATION, format!("{principal}:{sig}"))
            .header(DATE_HEADER, DATE)
            .header(NONCE_HEADER, nonce)
    }

    #[test]
    fn fingerprint_includes_query() {
        let uri: Uri = "/v1/whoami?verbose=1".parse().unwrap();
        assert_eq!(request_fingerprint(&uri), "/v1/whoami?verbose=1");
    }

    #[test]
    fn request_is_built_from_headers() {
        let parts = parts_for(signed_builder("alice", "tok", "POST", "/v1/logout", "n1"));
        let request = authorization_request(&parts).unwrap();
        assert_eq!(request.principal.as_deref(), Some("alice"));
        assert_eq!(request.request_fingerprint, "/v1/logout");
        assert_eq!(request.http_method, "POST");
        assert_eq!(request.date_header, DATE);
        assert_eq!(request.nonce.as_deref(), Some("n1"));
    }

    #[test]
    fn missing_headers_are_rejected() {
        let parts = parts_for(Request::builder().uri("/test"));
        assert!(matches!(
            authorization_request(&parts),
            Err(AuthError::MissingAuthHeader)
        ));

        let parts = parts_for(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "Bearer abc"),
        );
        assert!(matches!(
            authorization_request(&parts),
            Err(AuthError::InvalidAuthHeader)
        ));

        let parts = parts_for(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "alice:c2ln")
                .header(DATE_HEADER, DATE),
        );
        assert!(matches!(
            authorization_request(&parts),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[tokio::test]
    async fn signed_extractor_accepts_valid_signature() {
        let state = AppState::default();
        state.sessions.register_principal("alice").unwrap();
        let session = state.sessions.create_session("alice").unwrap();

        let mut parts = parts_for(signed_builder(
            "alice",
            session.token.as_str(),
            "GET",
            "/v1/whoami",
            "n1",
        ));
        let Signed(principal) = Signed::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(principal.principal_id, "alice");
        assert_eq!(principal.session_id, session.id);
    }

    #[tokio::test]
    async fn signed_extractor_rejects_wrong_target() {
        let state = AppState::default();
        state.sessions.register_principal("alice").unwrap();
        let session = state.sessions.create_session("alice").unwrap();

        // Signed for one path, sent to another.
        let sig = encode_signature(&sign(session.token.as_str(), "/v1/whoami", "GET", DATE, "n1"));
        let mut parts = parts_for(
            Request::builder()
                .uri("/v1/logout")
                .header(AUTHORIZATION, format!("alice:{sig}"))
                .header(DATE_HEADER, DATE)
                .header(NONCE_HEADER, "n1"),
        );
        let result = Signed::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::AuthenticationFailure)));
    }
}
