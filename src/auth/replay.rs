// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nonce replay guard.
//!
//! Remembers the most recent `(principal_id, nonce)` pairs of successfully
//! authorized requests in a bounded LRU. Pairs that have been evicted can be
//! replayed again, so pair this with a date skew limit when the capacity is
//! small relative to request volume.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

pub struct ReplayGuard {
    seen: Mutex<LruCache<(String, String), ()>>,
}

impl ReplayGuard {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            seen: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record a nonce for a principal. Returns `false` if it was already seen.
    pub fn check_and_record(&self, principal_id: &str, nonce: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.put((principal_id.to_string(), nonce.to_string()), ())
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(capacity: usize) -> ReplayGuard {
        ReplayGuard::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn repeated_nonce_is_rejected() {
        let guard = guard(16);
        assert!(guard.check_and_record("alice", "n1"));
        assert!(!guard.check_and_record("alice", "n1"));
        assert!(guard.check_and_record("alice", "n2"));
    }

    #[test]
    fn nonces_are_per_principal() {
        let guard = guard(16);
        assert!(guard.check_and_record("alice", "n1"));
        assert!(guard.check_and_record("bob", "n1"));
    }

    #[test]
    fn capacity_bounds_memory() {
        let guard = guard(2);
        assert!(guard.check_and_record("alice", "n1"));
        assert!(guard.check_and_record("alice", "n2"));
        assert!(guard.check_and_record("alice", "n3"));
        // n1 was evicted
        assert!(guard.check_and_record("alice", "n1"));
    }
}
