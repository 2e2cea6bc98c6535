// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use request_auth::{
    api::router,
    auth::StaticCredentials,
    config::{LogFormat, Settings},
    session::{InMemorySessionStore, InactivitySweeper, RedbSessionStore, SessionStore},
    state::AppState,
};

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_target(true))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

fn open_store(settings: &Settings) -> Result<Arc<dyn SessionStore>, Box<dyn Error>> {
    match settings.session_db_path() {
        Some(path) => {
            let store = RedbSessionStore::open(&path)?;
            info!(path = %path.display(), "Session database opened");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATA_DIR not set, sessions are kept in memory and lost on restart");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "request-auth starting");
    info!(
        scheme = ?settings.evaluator.scheme,
        scope = ?settings.evaluator.scope,
        date_policy = ?settings.evaluator.date_policy,
        replay_cache = settings.replay_cache_size.map_or(0, |n| n.get()),
        "Authorization policy"
    );

    let store = open_store(&settings)?;
    let mut state = AppState::new(store, settings.evaluator, settings.replay_cache_size);

    if let Some(users) = settings.auth_users.as_deref() {
        warn!("AUTH_USERS is set: static development logins are enabled");
        let credentials = StaticCredentials::parse(users);
        for id in credentials.identifiers() {
            state.sessions.register_principal(id)?;
        }
        state = state.with_credentials(Arc::new(credentials));
    }

    for (principal_id, role) in &settings.principal_roles {
        state.sessions.register_principal(principal_id)?;
        state.sessions.assign_role(principal_id, *role)?;
    }

    let shutdown = CancellationToken::new();
    let sweeper = InactivitySweeper::new(
        state.sessions.clone(),
        settings.inactivity_minutes,
        settings.sweep_interval,
    );
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);
    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down background tasks");
    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Session sweeper did not stop cleanly");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
