// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request Auth - Signed-Request Session Authentication
//!
//! Issues a secret session token per login and authenticates every later
//! request by a signature derived from that token, so the token itself never
//! crosses the wire again.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Signature scheme, authorization evaluator, replay guard
//! - `session` - Principals, sessions, stores and the inactivity sweeper

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
