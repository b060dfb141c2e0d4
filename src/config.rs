// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! parsed [`AppConfig`]. Configuration is loaded from the environment (and an
//! optional `.env` file) once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWKS_URI` | JWKS endpoint for JWT verification | Required |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Unchecked |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Unchecked |
//! | `JWKS_CACHE_TTL_SECS` | Key set cache lifetime | `600` |
//! | `JWKS_REQUESTS_PER_MINUTE` | Key set fetch budget | `5` |
//! | `S3_ENDPOINT` | S3-compatible endpoint (forces path-style) | AWS |
//! | `S3_REGION` | Bucket region | `us-east-1` |
//! | `S3_BUCKET` | Bucket holding audio objects | Required |
//! | `AWS_ACCESS_KEY_ID` | Static access key | Default chain |
//! | `AWS_SECRET_ACCESS_KEY` | Static secret key | Default chain |
//! | `UPLOAD_URL_EXPIRES_IN` | Upload URL lifetime in seconds (max `604800`) | `900` |
//! | `MAX_PLAYBACK_HOURS` | Upper bound for playback URL lifetime | `168` |
//! | `AUDIT_DB_PATH` | Audit database file | `data/audit.redb` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::jwks::{DEFAULT_CACHE_TTL, DEFAULT_REQUESTS_PER_MINUTE};
use crate::files::FileLimits;

/// Environment variable name for the JWKS endpoint URL.
pub const JWKS_URI_ENV: &str = "JWKS_URI";

/// Environment variable name for the expected `aud` claim.
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";

/// Environment variable name for the expected `iss` claim.
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";

pub const JWKS_CACHE_TTL_SECS_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_REQUESTS_PER_MINUTE_ENV: &str = "JWKS_REQUESTS_PER_MINUTE";

/// Environment variable name for a custom S3 endpoint (MinIO, LocalStack).
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const S3_REGION_ENV: &str = "S3_REGION";
pub const S3_BUCKET_ENV: &str = "S3_BUCKET";
pub const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Environment variable name for the upload URL lifetime, in seconds.
pub const UPLOAD_URL_EXPIRES_IN_ENV: &str = "UPLOAD_URL_EXPIRES_IN";

/// Environment variable name for the playback URL clamp, in hours.
pub const MAX_PLAYBACK_HOURS_ENV: &str = "MAX_PLAYBACK_HOURS";

pub const AUDIT_DB_PATH_ENV: &str = "AUDIT_DB_PATH";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_S3_REGION: &str = "us-east-1";
pub const DEFAULT_AUDIT_DB_PATH: &str = "data/audit.redb";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Longest lifetime a SigV4 presigned URL may carry (7 days).
pub const MAX_UPLOAD_URL_EXPIRES_IN_SECS: u64 = 604_800;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwks_uri: Url,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub jwks_cache_ttl: Duration,
    pub jwks_requests_per_minute: u32,
}

/// Object store connection settings.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: Option<Url>,
    pub region: String,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Fully parsed service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub s3: S3Settings,
    pub files: FileLimits,
    pub audit_db_path: PathBuf,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present;
    /// variables already set in the environment take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwks_uri = get(JWKS_URI_ENV).ok_or(ConfigError::Missing(JWKS_URI_ENV))?;
        let jwks_cache_ttl = parse_or(
            JWKS_CACHE_TTL_SECS_ENV,
            get(JWKS_CACHE_TTL_SECS_ENV),
            DEFAULT_CACHE_TTL.as_secs(),
        )?;
        let jwks_requests_per_minute = parse_or(
            JWKS_REQUESTS_PER_MINUTE_ENV,
            get(JWKS_REQUESTS_PER_MINUTE_ENV),
            DEFAULT_REQUESTS_PER_MINUTE,
        )?;
        let auth = AuthSettings {
            jwks_uri: parse_url(JWKS_URI_ENV, jwks_uri)?,
            audience: get(JWT_AUDIENCE_ENV),
            issuer: get(JWT_ISSUER_ENV),
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl),
            jwks_requests_per_minute: positive(
                JWKS_REQUESTS_PER_MINUTE_ENV,
                jwks_requests_per_minute,
            )?,
        };

        let s3 = S3Settings {
            endpoint: get(S3_ENDPOINT_ENV)
                .map(|v| parse_url(S3_ENDPOINT_ENV, v))
                .transpose()?,
            region: get(S3_REGION_ENV).unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            bucket: get(S3_BUCKET_ENV).ok_or(ConfigError::Missing(S3_BUCKET_ENV))?,
            access_key_id: get(AWS_ACCESS_KEY_ID_ENV),
            secret_access_key: get(AWS_SECRET_ACCESS_KEY_ENV),
        };

        let defaults = FileLimits::default();
        let upload_secs = parse_or(
            UPLOAD_URL_EXPIRES_IN_ENV,
            get(UPLOAD_URL_EXPIRES_IN_ENV),
            defaults.upload_url_ttl.as_secs(),
        )?;
        let max_playback_hours = parse_or(
            MAX_PLAYBACK_HOURS_ENV,
            get(MAX_PLAYBACK_HOURS_ENV),
            defaults.max_playback_hours,
        )?;
        let files = FileLimits {
            upload_url_ttl: Duration::from_secs(at_most(
                UPLOAD_URL_EXPIRES_IN_ENV,
                positive(UPLOAD_URL_EXPIRES_IN_ENV, upload_secs)?,
                MAX_UPLOAD_URL_EXPIRES_IN_SECS,
            )?),
            max_playback_hours: positive(MAX_PLAYBACK_HOURS_ENV, max_playback_hours)?,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(v) => v.parse().map_err(|reason| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?,
            auth,
            s3,
            files,
            audit_db_path: get(AUDIT_DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_DB_PATH)),
            log_format,
        })
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(&value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn positive<T>(name: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        })
    } else {
        Ok(value)
    }
}

fn at_most<T>(name: &'static str, value: T, max: T) -> Result<T, ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value > max {
        Err(ConfigError::Invalid {
            name,
            reason: format!("must be at most {max}"),
        })
    } else {
        Ok(value)
    }
}
