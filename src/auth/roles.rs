// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ParseVariantError;

/// Principal roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - May inspect and delete any principal and its sessions
/// - `Support` - May list any principal's sessions (read-only)
/// - `Client` - May only manage its own sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Support,
    /// Least privilege; every newly registered principal starts here
    #[default]
    Client,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Support, Role::Support) => true,
            (Role::Client, Role::Client) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Support => "support",
            Role::Client => "client",
        }
    }
}

impl FromStr for Role {
    type Err = ParseVariantError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "support" => Ok(Role::Support),
            "client" => Ok(Role::Client),
            _ => Err(ParseVariantError::new("role", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Support));
        assert!(Role::Admin.has_privilege(Role::Client));
    }

    #[test]
    fn support_is_not_admin() {
        assert!(Role::Support.has_privilege(Role::Support));
        assert!(!Role::Support.has_privilege(Role::Admin));
        assert!(!Role::Client.has_privilege(Role::Support));
        assert!(!Role::Client.has_privilege(Role::Admin));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Support".parse::<Role>().unwrap(), Role::Support);
        assert_eq!(Role::Client.to_string().parse::<Role>().unwrap(), Role::Client);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn default_role_is_client() {
        assert_eq!(Role::default(), Role::Client);
    }
}
