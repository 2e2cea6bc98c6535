// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Settings`] struct loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for the persistent session database | unset (in-memory) |
//! | `SESSION_INACTIVITY_MINUTES` | Idle time after which a session is swept | `60` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Time between sweeps | `60` |
//! | `SESSION_SCOPE` | Sessions that may sign (`all` or `latest`) | `all` |
//! | `SIGNATURE_SCHEME` | `sha256` or `hmac-sha256` | `sha256` |
//! | `MAX_CLOCK_SKEW_SECS` | Reject requests whose date is further off | unset (unchecked) |
//! | `REPLAY_CACHE_SIZE` | Remembered nonces, `0` disables | `10000` |
//! | `AUTH_USERS` | Development logins, `id:secret,...` | unset |
//! | `PRINCIPAL_ROLES` | Role seeds, `id:role,...` (`admin`, `support`, `client`) | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{DatePolicy, EvaluatorConfig, Role, SessionScope, SignatureScheme};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the session database directory.
///
/// When set, sessions are stored in `DATA_DIR/sessions.redb` and survive
/// restarts. When unset, an in-memory store is used.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const INACTIVITY_MINUTES_ENV: &str = "SESSION_INACTIVITY_MINUTES";
pub const SWEEP_INTERVAL_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const SESSION_SCOPE_ENV: &str = "SESSION_SCOPE";
pub const SIGNATURE_SCHEME_ENV: &str = "SIGNATURE_SCHEME";
pub const MAX_CLOCK_SKEW_ENV: &str = "MAX_CLOCK_SKEW_SECS";
pub const REPLAY_CACHE_SIZE_ENV: &str = "REPLAY_CACHE_SIZE";

/// Development-only static logins.
///
/// # Security
/// Never set this in production; wire a real [`crate::auth::CredentialVerifier`].
pub const AUTH_USERS_ENV: &str = "AUTH_USERS";

/// Roles applied at startup. Listed principals are registered if needed;
/// everyone else is a client.
pub const PRINCIPAL_ROLES_ENV: &str = "PRINCIPAL_ROLES";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_INACTIVITY_MINUTES: u32 = 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REPLAY_CACHE_SIZE: usize = 10_000;

/// File name of the session database inside `DATA_DIR`.
pub const SESSION_DB_FILE: &str = "sessions.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub inactivity_minutes: u32,
    pub sweep_interval: Duration,
    pub evaluator: EvaluatorConfig,
    /// `None` disables the replay guard
    pub replay_cache_size: Option<NonZeroUsize>,
    pub auth_users: Option<String>,
    pub principal_roles: Vec<(String, Role)>,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let inactivity_minutes =
            parse_or(var(INACTIVITY_MINUTES_ENV), INACTIVITY_MINUTES_ENV, DEFAULT_INACTIVITY_MINUTES)?;
        if inactivity_minutes == 0 {
            return Err(invalid(INACTIVITY_MINUTES_ENV, "0", "must be at least 1"));
        }

        let sweep_secs =
            parse_or(var(SWEEP_INTERVAL_ENV), SWEEP_INTERVAL_ENV, DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_secs == 0 {
            return Err(invalid(SWEEP_INTERVAL_ENV, "0", "must be at least 1"));
        }

        let scope = match var(SESSION_SCOPE_ENV) {
            None => SessionScope::default(),
            Some(v) => v
                .parse()
                .map_err(|_| invalid(SESSION_SCOPE_ENV, &v, "expected `all` or `latest`"))?,
        };

        let scheme = match var(SIGNATURE_SCHEME_ENV) {
            None => SignatureScheme::default(),
            Some(v) => v.parse().map_err(|_| {
                invalid(SIGNATURE_SCHEME_ENV, &v, "expected `sha256` or `hmac-sha256`")
            })?,
        };

        let date_policy = match var(MAX_CLOCK_SKEW_ENV) {
            None => DatePolicy::Unchecked,
            Some(v) => {
                let secs: i64 = v
                    .trim()
                    .parse()
                    .map_err(|_| invalid(MAX_CLOCK_SKEW_ENV, &v, "expected whole seconds"))?;
                if secs < 0 {
                    return Err(invalid(MAX_CLOCK_SKEW_ENV, &v, "must not be negative"));
                }
                let skew = chrono::Duration::try_seconds(secs)
                    .ok_or_else(|| invalid(MAX_CLOCK_SKEW_ENV, &v, "out of range"))?;
                DatePolicy::MaxSkew(skew)
            }
        };

        let replay_size: usize =
            parse_or(var(REPLAY_CACHE_SIZE_ENV), REPLAY_CACHE_SIZE_ENV, DEFAULT_REPLAY_CACHE_SIZE)?;

        let log_format = match var(LOG_FORMAT_ENV) {
            None => LogFormat::default(),
            Some(v) => match v.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(invalid(LOG_FORMAT_ENV, &v, "expected `json` or `pretty`")),
            },
        };

        let principal_roles = match var(PRINCIPAL_ROLES_ENV) {
            None => Vec::new(),
            Some(v) => parse_principal_roles(&v)?,
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            inactivity_minutes,
            sweep_interval: Duration::from_secs(sweep_secs),
            evaluator: EvaluatorConfig {
                scheme,
                scope,
                date_policy,
            },
            replay_cache_size: NonZeroUsize::new(replay_size),
            auth_users: var(AUTH_USERS_ENV),
            principal_roles,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(SESSION_DB_FILE))
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| invalid(name, &v, "expected a non-negative integer")),
    }
}

/// Parse `id:role,id:role`. The role follows the last `:`, so ids may
/// themselves contain colons.
fn parse_principal_roles(list: &str) -> Result<Vec<(String, Role)>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<(String, Role), ConfigError> {
            let (id, role) = entry
                .rsplit_once(':')
                .filter(|(id, _)| !id.is_empty())
                .ok_or_else(|| invalid(PRINCIPAL_ROLES_ENV, entry, "expected `id:role`"))?;
            let role: Role = role.parse().map_err(|_| {
                invalid(PRINCIPAL_ROLES_ENV, entry, "role must be admin, support or client")
            })?;
            Ok((id.to_string(), role))
        })
        .collect()
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason,
    }
}
