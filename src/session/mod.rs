// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Principals, their sessions, and everything that creates, refreshes and
//! destroys them.
//!
//! ## Storage Backends
//!
//! - [`InMemorySessionStore`] - process-local, used when `DATA_DIR` is unset
//! - [`RedbSessionStore`] - `DATA_DIR/sessions.redb`, survives restarts
//!
//! Both sit behind the [`SessionStore`] trait; nothing above this module
//! touches a physical store.

pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod redb_store;
pub mod store;
pub mod sweeper;
pub mod token;

pub use lifecycle::{SessionError, SessionManager, SessionResult};
pub use memory::InMemorySessionStore;
pub use models::{PrincipalRecord, Session, SessionToken};
pub use redb_store::RedbSessionStore;
pub use store::{SessionStore, StoreError, StoreResult};
pub use sweeper::InactivitySweeper;
