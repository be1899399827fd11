// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; any error here is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MASTER_KEY` | 32-byte key wrapping every content key, as 64 hex chars | Required |
//! | `DATA_DIR` | Root directory for blobs and the metadata database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWT_SECRET` | HS256 secret for bearer tokens | Required |
//! | `AUTH_JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `PUBLIC_BASE_URL` | Prefix for share links handed to creators | `http://localhost:8080` |
//! | `MAX_UPLOAD_BYTES` | Upload body limit | `52428800` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::crypto::{CryptoError, MasterKey};
use crate::storage::paths::DATA_ROOT;

/// Master key, hex encoded. Never logged.
pub const MASTER_KEY_ENV: &str = "MASTER_KEY";

/// Environment variable name for the data directory path.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// HS256 signing secret shared with the identity service.
pub const AUTH_JWT_SECRET_ENV: &str = "AUTH_JWT_SECRET";

/// If set, tokens whose `iss` differs are rejected.
pub const AUTH_JWT_ISSUER_ENV: &str = "AUTH_JWT_ISSUER";

pub const PUBLIC_BASE_URL_ENV: &str = "PUBLIC_BASE_URL";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Fully resolved startup configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub master_key: MasterKey,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("master_key", &self.master_key)
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("public_base_url", &self.public_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. `lookup` returns `None` for unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let master_key = get(MASTER_KEY_ENV)
            .ok_or(ConfigError::Missing(MASTER_KEY_ENV))
            .and_then(|hex| {
                MasterKey::from_hex(&hex).map_err(|e| ConfigError::Invalid {
                    var: MASTER_KEY_ENV,
                    reason: match e {
                        CryptoError::InvalidKeyLength { expected, .. } => {
                            format!("expected {} hex characters", expected * 2)
                        }
                        other => other.to_string(),
                    },
                })
            })?;

        let jwt_secret = get(AUTH_JWT_SECRET_ENV).ok_or(ConfigError::Missing(AUTH_JWT_SECRET_ENV))?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    var: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let max_upload_bytes = match get(MAX_UPLOAD_BYTES_ENV) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: MAX_UPLOAD_BYTES_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let public_base_url = get(PUBLIC_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            master_key,
            data_dir: get(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_ROOT)),
            bind_addr,
            jwt_secret,
            jwt_issuer: get(AUTH_JWT_ISSUER_ENV),
            public_base_url,
            max_upload_bytes,
        })
    }
}
