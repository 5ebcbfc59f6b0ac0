//! Error types for the attribution-stamping service.
//! Central error enum plus the result alias used across the crate.

use crate::attribution::validator::ValidationError;
use crate::domain::dmg::DmgError;
use crate::domain::pe::PatchError;
use thiserror::Error;

/// Result type for stamping operations
pub type StubResult<T> = Result<T, StubError>;

/// Comprehensive error types for the stamping pipeline.
///
/// Errors are `Clone` so a single-flight group can hand the one failure of a
/// coalesced operation to every waiter.
#[derive(Error, Debug, Clone)]
pub enum StubError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("PE patch error: {0}")]
    PePatch(#[from] PatchError),

    #[error("DMG patch error: {0}")]
    DmgPatch(#[from] DmgError),

    #[error("fetch {url}: transport error: {detail}")]
    FetchTransport { url: String, detail: String },

    #[error("fetch {url}: expected 200, got {status}")]
    FetchBadStatus { url: String, status: u16 },

    #[error("fetch {url}: could not read body: {detail}")]
    FetchRead { url: String, detail: String },

    #[error("resolve {url}: expected 302, got {status}")]
    ResolveBadStatus { url: String, status: u16 },

    #[error("resolve {url}: 302 without a Location header")]
    ResolveNoLocation { url: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StubError {
    /// Classification tag used by the request handler for logging and the
    /// `request_error` counter.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            StubError::Validation(_) => "validation",
            StubError::FetchTransport { .. }
            | StubError::FetchBadStatus { .. }
            | StubError::FetchRead { .. }
            | StubError::ResolveBadStatus { .. }
            | StubError::ResolveNoLocation { .. } => "fetchstub",
            _ => "modifystub",
        }
    }

    /// URL attached to a fetch-class error, if any.
    #[must_use]
    pub fn fetch_url(&self) -> Option<&str> {
        match self {
            StubError::FetchTransport { url, .. }
            | StubError::FetchBadStatus { url, .. }
            | StubError::FetchRead { url, .. }
            | StubError::ResolveBadStatus { url, .. }
            | StubError::ResolveNoLocation { url } => Some(url),
            _ => None,
        }
    }

    /// Upstream status code attached to a fetch-class error, if any.
    #[must_use]
    pub fn fetch_status(&self) -> Option<u16> {
        match self {
            StubError::FetchBadStatus { status, .. }
            | StubError::ResolveBadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StubError::FetchBadStatus {
            url: "https://example.com/stub".to_string(),
            status: 404,
        };
        assert_eq!(
            error.to_string(),
            "fetch https://example.com/stub: expected 200, got 404"
        );

        let error = StubError::Configuration("BASE_URL is required".to_string());
        assert_eq!(
            error.to_string(),
            "configuration error: BASE_URL is required"
        );
    }

    #[test]
    fn test_error_classification() {
        let fetch = StubError::FetchTransport {
            url: "u".into(),
            detail: "d".into(),
        };
        assert_eq!(fetch.error_type(), "fetchstub");
        assert_eq!(fetch.fetch_url(), Some("u"));
        assert_eq!(fetch.fetch_status(), None);

        let resolve = StubError::ResolveBadStatus {
            url: "u".into(),
            status: 200,
        };
        assert_eq!(resolve.error_type(), "fetchstub");
        assert_eq!(resolve.fetch_status(), Some(200));

        let patch = StubError::PePatch(PatchError::Unsigned);
        assert_eq!(patch.error_type(), "modifystub");
    }
}
