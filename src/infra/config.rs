//! Service configuration from the environment.
//!
//! Every knob the service understands is read once at startup and validated
//! before the listener is bound. Invalid configuration is a startup failure,
//! never a per-request one.

use crate::infra::error::{StubError, StubResult};
use std::time::Duration;

const HMAC_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10 * 60);
const ADDR_DEFAULT: &str = "127.0.0.1:8000";

/// How modified installers are returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMode {
    /// Stream the patched bytes in the response body.
    Direct,
    /// Publish the patched artifact and 302 to its CDN URL.
    Redirect,
}

/// Which object store backs redirect mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Gcs,
    S3,
}

/// Fully validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream bouncer base URL (`BASE_URL`, required).
    pub base_url: String,
    /// HMAC-SHA256 key over the base64 attribution code; empty disables
    /// signature checking (`HMAC_KEY`).
    pub hmac_key: String,
    /// Parsed `HMAC_TIMEOUT`. Retained for compatibility; not enforced.
    pub hmac_timeout: Duration,
    /// `RETURN_MODE`, default direct.
    pub return_mode: ReturnMode,
    /// `STORAGE_BACKEND`, required in redirect mode.
    pub storage_backend: Option<StorageBackendKind>,
    /// Target bucket (`GCS_BUCKET` / `S3_BUCKET`).
    pub bucket: String,
    /// Object key prefix (`GCS_PREFIX` / `S3_PREFIX`).
    pub key_prefix: String,
    /// Public URL prefix for Location headers (`CDN_PREFIX`).
    pub cdn_prefix: String,
    /// Listen address (`ADDR`).
    pub addr: String,
    /// Error reporter DSN (`SENTRY_DSN`); empty disables reporting.
    pub sentry_dsn: String,
    /// `DEBUG_MODE` boolean.
    pub debug_mode: bool,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> StubResult<Self> {
        let get = |name: &str| std::env::var(name).unwrap_or_default();

        let base_url = get("BASE_URL");
        if base_url.is_empty() {
            return Err(StubError::Configuration("BASE_URL is required".into()));
        }

        let hmac_timeout = match get("HMAC_TIMEOUT").as_str() {
            "" => HMAC_TIMEOUT_DEFAULT,
            raw => humantime::parse_duration(raw).map_err(|e| {
                StubError::Configuration(format!("could not parse HMAC_TIMEOUT: {e}"))
            })?,
        };

        let return_mode = match get("RETURN_MODE").as_str() {
            "redirect" => ReturnMode::Redirect,
            _ => ReturnMode::Direct,
        };

        let storage_backend = match get("STORAGE_BACKEND").as_str() {
            "gcs" => Some(StorageBackendKind::Gcs),
            "s3" => Some(StorageBackendKind::S3),
            "" => None,
            other => {
                return Err(StubError::Configuration(format!(
                    "invalid STORAGE_BACKEND value: {other}"
                )))
            }
        };

        let bucket = match storage_backend {
            Some(StorageBackendKind::Gcs) => get("GCS_BUCKET"),
            Some(StorageBackendKind::S3) => get("S3_BUCKET"),
            None => String::new(),
        };
        let key_prefix = match storage_backend {
            Some(StorageBackendKind::Gcs) => get("GCS_PREFIX"),
            Some(StorageBackendKind::S3) => get("S3_PREFIX"),
            None => String::new(),
        };

        if return_mode == ReturnMode::Redirect {
            if storage_backend.is_none() {
                return Err(StubError::Configuration(
                    "STORAGE_BACKEND is required in redirect mode".into(),
                ));
            }
            if bucket.is_empty() {
                return Err(StubError::Configuration(
                    "storage bucket is required in redirect mode".into(),
                ));
            }
        }

        let mut cdn_prefix = get("CDN_PREFIX");
        if cdn_prefix.is_empty() {
            cdn_prefix = match storage_backend {
                Some(StorageBackendKind::Gcs) => {
                    format!("https://storage.googleapis.com/{bucket}/")
                }
                Some(StorageBackendKind::S3) => format!("https://s3.amazonaws.com/{bucket}/"),
                None => String::new(),
            };
        }

        let mut addr = get("ADDR");
        if addr.is_empty() {
            addr = ADDR_DEFAULT.to_string();
        }

        let debug_mode = get("DEBUG_MODE").parse::<bool>().unwrap_or(false);

        Ok(Config {
            base_url,
            hmac_key: get("HMAC_KEY"),
            hmac_timeout,
            return_mode,
            storage_backend,
            bucket,
            key_prefix,
            cdn_prefix,
            addr,
            sentry_dsn: get("SENTRY_DSN"),
            debug_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable driven construction is exercised end to end by the
    // service binary; unit tests focus on the pure pieces.

    #[test]
    fn default_hmac_timeout_is_ten_minutes() {
        assert_eq!(HMAC_TIMEOUT_DEFAULT, Duration::from_secs(600));
    }

    #[test]
    fn parse_humantime_durations() {
        assert_eq!(
            humantime::parse_duration("10m").unwrap(),
            Duration::from_secs(600)
        );
        assert_eq!(
            humantime::parse_duration("90s").unwrap(),
            Duration::from_secs(90)
        );
    }
}
