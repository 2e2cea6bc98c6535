// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership checks performed after authentication succeeds.
//!
//! Failing here is an [`AuthError::AuthorizationFailure`] (403): the caller is
//! known, just not allowed to act on someone else's resources. Elevated roles
//! bypass the ownership check for the operations they are granted.

use super::error::AuthError;
use super::request::AuthenticatedPrincipal;
use super::roles::Role;

/// Trait for resources that have an owning principal.
pub trait OwnedResource {
    fn owner_principal_id(&self) -> &str;
}

/// A principal owns itself.
impl OwnedResource for str {
    fn owner_principal_id(&self) -> &str {
        self
    }
}

/// Verify that the authenticated principal owns `resource`, or holds at least
/// the `elevated` role.
///
/// `Role::Client` as `elevated` grants nothing beyond ownership.
pub fn ensure_access<R: OwnedResource + ?Sized>(
    principal: &AuthenticatedPrincipal,
    resource: &R,
    elevated: Role,
) -> Result<(), AuthError> {
    let owner = resource.owner_principal_id();
    if owner == principal.principal_id {
        return Ok(());
    }

    if elevated != Role::Client && principal.role.has_privilege(elevated) {
        tracing::info!(
            principal_id = %principal.principal_id,
            role = %principal.role,
            owner = %owner,
            "Elevated access to another principal"
        );
        return Ok(());
    }

    tracing::warn!(
        principal_id = %principal.principal_id,
        role = %principal.role,
        owner = %owner,
        "Ownership check failed"
    );
    Err(AuthError::AuthorizationFailure(
        "principal may only manage its own sessions".to_string(),
    ))
}
