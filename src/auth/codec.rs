// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport encoding of signatures and the `Authorization` header value.
//!
//! Header format: `<principal_id>:<base64(signature)>`. Standard base64 never
//! contains `:`, so the header splits at the last one and principal ids such
//! as `github:42` pass through intact.

use base64ct::{Base64, Encoding};

use super::signature::SignatureBytes;

/// Standard (padded) base64 of a signature.
pub fn encode_signature(signature: &SignatureBytes) -> String {
    Base64::encode_string(signature)
}

/// Decode a transport-encoded signature. `None` on any encoding error.
pub fn decode_signature(encoded: &str) -> Option<Vec<u8>> {
    Base64::decode_vec(encoded.trim()).ok()
}

/// A parsed `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub principal_id: String,
    /// Still transport-encoded; decoding happens during evaluation
    pub signature: String,
}

impl AuthorizationHeader {
    /// Split `<principal_id>:<signature>` at the last `:`. Both halves must be
    /// non-empty.
    pub fn parse(value: &str) -> Option<Self> {
        let (principal_id, signature) = value.trim().rsplit_once(':')?;
        if principal_id.is_empty() || signature.is_empty() {
            return None;
        }
        Some(Self {
            principal_id: principal_id.to_string(),
            signature: signature.to_string(),
        })
    }

    pub fn to_header_value(&self) -> String {
        format!("{}:{}", self.principal_id, self.signature)
    }
}
