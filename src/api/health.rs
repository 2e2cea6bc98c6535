// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

use crate::config::DATA_DIR_ENV;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// Data directory availability (if configured).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Whether the session store answers a ping.
    pub session_store: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_data_dir() -> Option<String> {
    let dir = std::env::var(DATA_DIR_ENV).ok()?;
    Some(if Path::new(&dir).exists() { "ok" } else { "missing" }.to_string())
}

fn check_session_store(state: &AppState) -> String {
    match state.sessions.store().ping() {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Session store health check failed");
            "unavailable".to_string()
        }
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let data_dir = check_data_dir();
    let session_store = check_session_store(&state);

    let all_ok = data_dir.as_deref().is_none_or(|s| s == "ok") && session_store == "ok";

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            data_dir,
            session_store,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler. Always 200 while the process runs.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};

    use crate::auth::{EvaluatorConfig, Role};
    use crate::session::{PrincipalRecord, Session, SessionStore, StoreError, StoreResult};

    /// A store whose backing device has gone away.
    struct UnreachableStore;

    fn detached<T>() -> StoreResult<T> {
        Err(StoreError::Io(std::io::Error::other("disk detached")))
    }

    impl SessionStore for UnreachableStore {
        fn register_principal(&self, _: &str) -> StoreResult<bool> {
            detached()
        }
        fn find_principal(&self, _: &str) -> StoreResult<Option<PrincipalRecord>> {
            detached()
        }
        fn set_role(&self, _: &str, _: Role) -> StoreResult<()> {
            detached()
        }
        fn delete_principal(&self, _: &str) -> StoreResult<Option<usize>> {
            detached()
        }
        fn insert_session(&self, _: &str, _: &Session) -> StoreResult<()> {
            detached()
        }
        fn touch_session(&self, _: &str, _: &str, _: DateTime<Utc>) -> StoreResult<bool> {
            detached()
        }
        fn remove_session(&self, _: &str, _: &str) -> StoreResult<bool> {
            detached()
        }
        fn remove_inactive(&self, _: DateTime<Utc>) -> StoreResult<usize> {
            detached()
        }
        fn ping(&self) -> StoreResult<()> {
            detached()
        }
    }

    #[tokio::test]
    async fn in_memory_store_is_healthy() {
        let (status, Json(body)) = health(State(AppState::default())).await;
        // DATA_DIR may be set in the test environment; only the store check is stable.
        assert_eq!(body.checks.session_store, "ok");
        assert_eq!(body.checks.service, "ok");
        if body.checks.data_dir.is_none() {
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn failing_store_degrades_health() {
        let state = AppState::new(Arc::new(UnreachableStore), EvaluatorConfig::default(), None);
        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.session_store, "unavailable");
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }
}
