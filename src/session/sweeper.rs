// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Inactivity Sweeper
//!
//! Background task that periodically deletes sessions idle for longer than
//! the configured inactivity window.
//!
//! A request whose lookup already completed is evaluated against its own
//! snapshot of the principal record, so a sweep running concurrently cannot
//! cause a spurious rejection; requests arriving after the sweep correctly
//! see the session gone.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::lifecycle::SessionManager;

pub struct InactivitySweeper {
    sessions: SessionManager,
    max_inactivity_minutes: u32,
    sweep_interval: Duration,
}

impl InactivitySweeper {
    pub fn new(sessions: SessionManager, max_inactivity_minutes: u32, sweep_interval: Duration) -> Self {
        Self {
            sessions,
            max_inactivity_minutes,
            sweep_interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            max_inactivity_minutes = self.max_inactivity_minutes,
            "Session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session sweeper shutting down");
                return;
            }

            self.sweep_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// One sweep. Store access is blocking, so it runs off the async workers.
    async fn sweep_step(&self) -> usize {
        let sessions = self.sessions.clone();
        let window = self.max_inactivity_minutes;
        match tokio::task::spawn_blocking(move || sessions.expire_inactive(window)).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to expire inactive sessions");
                0
            }
            Err(e) => {
                error!(error = %e, "Session sweep task panicked");
                0
            }
        }
    }
}
