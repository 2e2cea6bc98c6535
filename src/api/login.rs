// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login endpoints. The only routes that hand out a session token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::{LoginRequest, LoginResponse, SocialLoginRequest},
    state::AppState,
};

/// Open a session for an already-verified principal.
///
/// Registration is idempotent, so the first login of a principal the store
/// has never seen creates its record.
fn open_session(state: &AppState, principal_id: &str) -> Result<LoginResponse, ApiError> {
    if state.sessions.register_principal(principal_id)? {
        tracing::info!(principal_id = %principal_id, "Registered new principal");
    }
    let session = state.sessions.create_session(principal_id)?;
    tracing::info!(principal_id = %principal_id, session_id = %session.id, "Session created");
    Ok(LoginResponse::new(principal_id, session))
}

#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    tag = "Login",
    responses(
        (status = 201, description = "Session created", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let Some(principal_id) = state
        .credentials
        .verify(&request.identifier, &request.secret)?
    else {
        tracing::warn!(identifier = %request.identifier, "Login rejected");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    let response = open_session(&state, &principal_id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/v1/login/{provider}",
    request_body = SocialLoginRequest,
    params(
        ("provider" = String, Path, description = "Social provider id, e.g. `github`")
    ),
    tag = "Login",
    responses(
        (status = 201, description = "Session created", body = LoginResponse),
        (status = 401, description = "Provider rejected the access token"),
        (status = 404, description = "Unknown provider")
    )
)]
pub async fn social_login(
    Path(provider): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SocialLoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let connector = state
        .social
        .get(&provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown provider: {provider}")))?;

    let Some(principal_id) = connector.resolve_principal(&request.access_token).await? else {
        tracing::warn!(provider = %provider, "Social login rejected");
        return Err(ApiError::unauthorized("Invalid access token"));
    };
    let response = open_session(&state, &principal_id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::credentials::{ConnectorFuture, SocialConnector};
    use crate::auth::{SocialProviders, StaticCredentials};

    struct PrefixConnector;

    impl SocialConnector for PrefixConnector {
        fn resolve_principal<'a>(&'a self, access_token: &'a str) -> ConnectorFuture<'a> {
            Box::pin(async move { Ok(access_token.strip_prefix("ok-").map(|id| format!("gh:{id}"))) })
        }
    }

    fn state() -> AppState {
        AppState::default()
            .with_credentials(Arc::new(StaticCredentials::parse("alice:wonderland")))
            .with_social_providers(
                SocialProviders::new().with_provider("github", Arc::new(PrefixConnector)),
            )
    }

    fn credentials(identifier: &str, secret: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        })
    }

    #[tokio::test]
    async fn login_issues_distinct_sessions() {
        let state = state();

        let (status, Json(first)) = login(State(state.clone()), credentials("alice", "wonderland"))
            .await
            .expect("login succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.principal_id, "alice");
        assert_eq!(first.session_token.len(), 43);

        let (_, Json(second)) = login(State(state.clone()), credentials("alice", "wonderland"))
            .await
            .expect("second login succeeds");
        assert_ne!(first.session_token, second.session_token);
        assert_ne!(first.session_id, second.session_id);

        assert_eq!(state.sessions.list_sessions("alice").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let state = state();
        let err = login(State(state.clone()), credentials("alice", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert!(state.sessions.store().find_principal("alice").unwrap().is_none());
    }

    #[tokio::test]
    async fn first_social_login_registers_principal() {
        let state = state();
        let request = Json(SocialLoginRequest {
            access_token: "ok-42".to_string(),
        });
        let (status, Json(response)) =
            social_login(Path("github".to_string()), State(state.clone()), request)
                .await
                .expect("social login succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.principal_id, "gh:42");
        assert_eq!(state.sessions.list_sessions("gh:42").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn social_login_errors() {
        let state = state();
        let err = social_login(
            Path("facebook".to_string()),
            State(state.clone()),
            Json(SocialLoginRequest {
                access_token: "ok-1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = social_login(
            Path("github".to_string()),
            State(state),
            Json(SocialLoginRequest {
                access_token: "bad".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
