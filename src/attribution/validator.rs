//! Attribution payload validation and sanitization.
//!
//! The payload arrives as URL-safe base64 (with `.` as the padding
//! character) over a form-encoded mapping, optionally signed with
//! HMAC-SHA256 over the raw base64 string. Validation whitelists keys and
//! sources, fills required fields, and enforces the RTAMO referer rule.

use crate::attribution::code::Code;
use crate::attribution::query::{parse_query, QueryParseError};
use crate::attribution::whitelist::is_whitelisted;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Matches the attribution area reserved by the installer build system.
const MAX_UNESCAPED_CODE_LEN: usize = 1010;

const MAX_CODE_LEN: usize = 5000;
const MAX_SIG_LEN: usize = 5000;

const MOZILLA_ORG_PREFIX: &str = "https://www.mozilla.org/";

const VALID_ATTRIBUTION_KEYS: &[&str] = &[
    "source",
    "medium",
    "campaign",
    "content",
    "experiment",
    "installer_type",
    "variation",
    "ua",
    "visit_id",
    "session_id",
    "client_id",
    "client_id_ga4",
    "dlsource",
];

/// Keys rewritten to `(not set)` when missing or empty.
const REQUIRED_ATTRIBUTION_KEYS: &[&str] = &["source", "medium", "campaign", "content"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("code is empty")]
    EmptyCode,
    #[error("base64 code longer than {MAX_CODE_LEN} characters")]
    CodeTooLong,
    #[error("sig longer than {MAX_SIG_LEN} characters")]
    SigTooLong,
    #[error("could not base64 decode code")]
    BadBase64,
    #[error("code longer than {MAX_UNESCAPED_CODE_LEN} characters")]
    DecodedTooLong,
    #[error("could not parse code: {0}")]
    BadQuery(#[from] QueryParseError),
    #[error("HMAC would not validate")]
    BadSignature,
    #[error("{0} is not a valid attribution key")]
    InvalidKey(String),
    #[error("RTAMO attribution does not have https://www.mozilla.org referer header")]
    RtamoBadReferer,
}

/// Validates and sanitizes attribution codes.
#[derive(Debug, Clone)]
pub struct Validator {
    hmac_key: String,
    /// Accepted for compatibility; timestamps are stripped before
    /// validation, so no age check is applied.
    #[allow(dead_code)]
    timeout: Duration,
}

impl Validator {
    #[must_use]
    pub fn new(hmac_key: &str, timeout: Duration) -> Self {
        Self {
            hmac_key: hmac_key.to_string(),
            timeout,
        }
    }

    /// Validate `code` and `sig`, returning the sanitized record.
    pub fn validate(
        &self,
        code: &str,
        sig: &str,
        referer_header: &str,
    ) -> Result<Code, ValidationError> {
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if code.len() > MAX_CODE_LEN {
            return Err(ValidationError::CodeTooLong);
        }
        if sig.len() > MAX_SIG_LEN {
            return Err(ValidationError::SigTooLong);
        }

        // URL-safe base64 with '.' standing in for the '=' pad character.
        let unescaped = URL_SAFE_NO_PAD
            .decode(code.trim_end_matches('.'))
            .map_err(|_| ValidationError::BadBase64)?;

        if unescaped.len() > MAX_UNESCAPED_CODE_LEN {
            return Err(ValidationError::DecodedTooLong);
        }

        let decoded =
            String::from_utf8(unescaped).map_err(|_| QueryParseError::InvalidUtf8)?;
        let mut values = parse_query(&decoded)?;

        if !self.hmac_key.is_empty() {
            self.validate_signature(code, sig)?;
        }

        values.del("timestamp");

        for key in values.keys() {
            if !VALID_ATTRIBUTION_KEYS.contains(&key) {
                return Err(ValidationError::InvalidKey(key.to_string()));
            }
        }

        if !is_whitelisted(values.get("source")) {
            values.set("source", "(other)");
        }

        for key in REQUIRED_ATTRIBUTION_KEYS {
            if values.get(key).is_empty() {
                values.set(key, "(not set)");
            }
        }

        // `client_id` is the preferred spelling of the analytics client id;
        // `visit_id` remains accepted for backward compatibility.
        let mut client_id = values.get("client_id").to_string();
        if client_id.is_empty() {
            client_id = values.get("visit_id").to_string();
        }

        let attribution_code = Code {
            source: values.get("source").to_string(),
            medium: values.get("medium").to_string(),
            campaign: values.get("campaign").to_string(),
            content: values.get("content").to_string(),
            experiment: values.get("experiment").to_string(),
            installer_type: values.get("installer_type").to_string(),
            variation: values.get("variation").to_string(),
            user_agent: values.get("ua").to_string(),
            client_id,
            client_id_ga4: values.get("client_id_ga4").to_string(),
            session_id: values.get("session_id").to_string(),
            download_source: values.get("dlsource").to_string(),
            raw_values: values,
            ..Code::default()
        };

        if attribution_code.from_rtamo() && !referer_header.starts_with(MOZILLA_ORG_PREFIX) {
            return Err(ValidationError::RtamoBadReferer);
        }

        Ok(attribution_code)
    }

    /// Constant-time check of the lowercase-hex HMAC-SHA256 signature over
    /// the raw base64 code string.
    pub fn validate_signature(&self, code: &str, sig: &str) -> Result<(), ValidationError> {
        let sig_bytes = hex::decode(sig).map_err(|_| ValidationError::BadSignature)?;

        let mut mac = HmacSha256::new_from_slice(self.hmac_key.as_bytes())
            .map_err(|_| ValidationError::BadSignature)?;
        mac.update(code.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| ValidationError::BadSignature)
    }
}
