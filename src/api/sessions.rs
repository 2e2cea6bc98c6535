// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{ensure_access, Role, Signed},
    error::ApiError,
    models::{
        LogoutQuery, SessionListResponse, SessionSummary, SessionsRemovedResponse, WhoAmIResponse,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/whoami",
    tag = "Sessions",
    responses(
        (status = 200, body = WhoAmIResponse),
        (status = 401, description = "Missing or invalid request signature")
    )
)]
pub async fn whoami(Signed(principal): Signed) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        principal_id: principal.principal_id,
        session_id: principal.session_id,
        role: principal.role,
        authenticated_at: principal.authenticated_at,
    })
}

#[utoipa::path(
    post,
    path = "/v1/logout",
    params(LogoutQuery),
    tag = "Sessions",
    responses(
        (status = 200, body = SessionsRemovedResponse),
        (status = 401, description = "Missing or invalid request signature")
    )
)]
pub async fn logout(
    Signed(principal): Signed,
    State(state): State<AppState>,
    Query(query): Query<LogoutQuery>,
) -> Result<Json<SessionsRemovedResponse>, ApiError> {
    let sessions_removed = if query.all {
        state.sessions.invalidate_all(&principal.principal_id)?
    } else {
        usize::from(
            state
                .sessions
                .invalidate(&principal.principal_id, &principal.session_id)?,
        )
    };
    tracing::info!(
        principal_id = %principal.principal_id,
        sessions_removed,
        "Logged out"
    );
    Ok(Json(SessionsRemovedResponse {
        principal_id: principal.principal_id,
        sessions_removed,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/principals/{principal_id}/sessions",
    params(
        ("principal_id" = String, Path, description = "Principal whose sessions to list")
    ),
    tag = "Sessions",
    responses(
        (status = 200, body = SessionListResponse),
        (status = 403, description = "Not the caller's own principal, and not support or admin")
    )
)]
pub async fn list_sessions(
    Signed(principal): Signed,
    Path(principal_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    ensure_access(&principal, principal_id.as_str(), Role::Support)?;
    let sessions = state.sessions.list_sessions(&principal_id)?;
    Ok(Json(SessionListResponse {
        principal_id,
        sessions: sessions.iter().map(SessionSummary::from).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/principals/{principal_id}/sessions/{session_id}",
    params(
        ("principal_id" = String, Path, description = "Owner of the session"),
        ("session_id" = String, Path, description = "Session to end")
    ),
    tag = "Sessions",
    responses(
        (status = 204),
        (status = 403, description = "Not the caller's own principal, and not admin"),
        (status = 404, description = "No such session")
    )
)]
pub async fn revoke_session(
    Signed(principal): Signed,
    Path((principal_id, session_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ensure_access(&principal, principal_id.as_str(), Role::Admin)?;
    if !state.sessions.invalidate(&principal_id, &session_id)? {
        return Err(ApiError::not_found(format!("Session not found: {session_id}")));
    }
    tracing::info!(
        principal_id = %principal_id,
        session_id = %session_id,
        revoked_by = %principal.principal_id,
        "Session revoked"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/principals/{principal_id}",
    params(
        ("principal_id" = String, Path, description = "Principal to delete")
    ),
    tag = "Sessions",
    responses(
        (status = 200, body = SessionsRemovedResponse),
        (status = 403, description = "Not the caller's own principal, and not admin")
    )
)]
pub async fn delete_principal(
    Signed(principal): Signed,
    Path(principal_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionsRemovedResponse>, ApiError> {
    ensure_access(&principal, principal_id.as_str(), Role::Admin)?;
    let sessions_removed = state.sessions.delete_principal(&principal_id)?;
    tracing::info!(
        principal_id = %principal_id,
        sessions_removed,
        deleted_by = %principal.principal_id,
        "Principal deleted"
    );
    Ok(Json(SessionsRemovedResponse {
        principal_id,
        sessions_removed,
    }))
}
