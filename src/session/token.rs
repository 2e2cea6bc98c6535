// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token generation.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};

use super::models::SessionToken;

/// Raw token entropy: 256 bits keeps birthday collisions out of reach for any
/// realistic number of sessions.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
#[error("system random number generator failed")]
pub struct EntropyError;

/// Generate a fresh session token from the OS CSPRNG (URL-safe base64, 43 chars).
pub fn generate_session_token(rng: &SystemRandom) -> Result<SessionToken, EntropyError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| EntropyError)?;
    Ok(SessionToken::new(Base64UrlUnpadded::encode_string(&bytes)))
}
