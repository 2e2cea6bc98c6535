// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signature engine.
//!
//! ## Canonical Signing String
//!
//! ```text
//! session_token ":" fingerprint "," method "," date "," nonce
//! ```
//!
//! This exact ordering and delimiter set is the wire contract shared with
//! every client. The default scheme hashes it with SHA-256; the session token
//! is part of the hashed material rather than an HMAC key, so the token's
//! secrecy rests on SHA-256 preimage resistance alone. `HmacSha256` is the
//! stronger construction but breaks compatibility with existing clients and is
//! only used when explicitly configured.
//!
//! Everything here is pure: no I/O, no clock, no randomness.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ParseVariantError;

type HmacSha256 = Hmac<Sha256>;

/// Length of every signature produced by this module.
pub const SIGNATURE_LEN: usize = 32;

/// Raw signature bytes. Transport encoding is the caller's job.
pub type SignatureBytes = [u8; SIGNATURE_LEN];

/// The request fields covered by a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedFields<'a> {
    pub fingerprint: &'a str,
    pub method: &'a str,
    pub date: &'a str,
    pub nonce: &'a str,
}

/// How the session token is combined with the request fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureScheme {
    /// `SHA-256(token ":" fingerprint "," method "," date "," nonce)`
    #[default]
    Sha256Concat,
    /// `HMAC-SHA256(key = token, fingerprint "," method "," date "," nonce)`
    HmacSha256,
}

impl FromStr for SignatureScheme {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" | "sha256-concat" => Ok(Self::Sha256Concat),
            "hmac-sha256" | "hmac" => Ok(Self::HmacSha256),
            _ => Err(ParseVariantError::new("signature scheme", s)),
        }
    }
}

impl SignatureScheme {
    /// Sign `fields` with a session token under this scheme.
    pub fn sign(&self, session_token: &str, fields: SignedFields<'_>) -> SignatureBytes {
        match self {
            Self::Sha256Concat => sign(
                session_token,
                fields.fingerprint,
                fields.method,
                fields.date,
                fields.nonce,
            ),
            Self::HmacSha256 => sign_hmac(session_token, fields),
        }
    }
}

/// Build the canonical signing string.
pub fn canonical_string(
    session_token: &str,
    fingerprint: &str,
    method: &str,
    date: &str,
    nonce: &str,
) -> String {
    format!("{session_token}:{}", request_material(fingerprint, method, date, nonce))
}

fn request_material(fingerprint: &str, method: &str, date: &str, nonce: &str) -> String {
    format!("{fingerprint},{method},{date},{nonce}")
}

/// SHA-256 over the canonical signing string.
pub fn sign(
    session_token: &str,
    fingerprint: &str,
    method: &str,
    date: &str,
    nonce: &str,
) -> SignatureBytes {
    let canonical = canonical_string(session_token, fingerprint, method, date, nonce);
    Sha256::digest(canonical.as_bytes()).into()
}

fn sign_hmac(session_token: &str, fields: SignedFields<'_>) -> SignatureBytes {
    let mut mac = match HmacSha256::new_from_slice(session_token.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(
        request_material(fields.fingerprint, fields.method, fields.date, fields.nonce).as_bytes(),
    );
    mac.finalize().into_bytes().into()
}

/// Compare two signatures without short-circuiting on the first mismatch.
pub fn signatures_match(expected: &SignatureBytes, supplied: &[u8]) -> bool {
    if supplied.len() != expected.len() {
        return false;
    }
    expected
        .iter()
        .zip(supplied)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
