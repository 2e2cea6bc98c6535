// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedPrincipal, Role},
    models::{
        LoginRequest, LoginResponse, SessionListResponse, SessionSummary, SessionsRemovedResponse,
        SocialLoginRequest, WhoAmIResponse,
    },
    state::AppState,
};

pub mod health;
pub mod login;
pub mod sessions;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/login", post(login::login))
        .route("/login/{provider}", post(login::social_login))
        .route("/whoami", get(sessions::whoami))
        .route("/logout", post(sessions::logout))
        .route(
            "/principals/{principal_id}",
            delete(sessions::delete_principal),
        )
        .route(
            "/principals/{principal_id}/sessions",
            get(sessions::list_sessions),
        )
        .route(
            "/principals/{principal_id}/sessions/{session_id}",
            delete(sessions::revoke_session),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        login::login,
        login::social_login,
        sessions::whoami,
        sessions::logout,
        sessions::list_sessions,
        sessions::revoke_session,
        sessions::delete_principal
    ),
    components(
        schemas(
            LoginRequest,
            SocialLoginRequest,
            LoginResponse,
            SessionSummary,
            SessionListResponse,
            SessionsRemovedResponse,
            WhoAmIResponse,
            AuthenticatedPrincipal,
            Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Login", description = "Credential and social logins"),
        (name = "Sessions", description = "Signed-request endpoints for session management")
    )
)]
struct ApiDoc;
