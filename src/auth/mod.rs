// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Signed-request authentication against per-login session tokens.
//!
//! ## Auth Flow
//!
//! 1. Client logs in (credentials or a social provider) and receives a
//!    session token exactly once
//! 2. For every later request the client computes
//!    `SHA-256(token ":" fingerprint "," method "," date "," nonce)`
//! 3. Server:
//!    - Looks up the claimed principal's live sessions
//!    - Recomputes the signature for each and compares
//!    - Rejects replayed nonces
//!    - Refreshes the matching session's last-access time
//!
//! ## Security
//!
//! - The session token never travels on the wire after login
//! - A denial never says which check failed
//! - Sessions are always looked up within the claimed principal
//! - Acting on another principal's sessions requires an elevated [`Role`]

pub mod authenticator;
pub mod codec;
pub mod credentials;
pub mod error;
pub mod evaluator;
pub mod extractor;
pub mod ownership;
pub mod replay;
pub mod request;
pub mod roles;
pub mod signature;

pub use authenticator::Authenticator;
pub use credentials::{CredentialVerifier, SocialConnector, SocialProviders, StaticCredentials};
pub use error::AuthError;
pub use evaluator::{AuthorizationEvaluator, DatePolicy, EvaluatorConfig, SessionMatch, SessionScope};
pub use extractor::Signed;
pub use ownership::{ensure_access, OwnedResource};
pub use replay::ReplayGuard;
pub use request::{AuthenticatedPrincipal, AuthorizationRequest};
pub use roles::Role;
pub use signature::SignatureScheme;
