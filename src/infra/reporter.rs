//! Error reporter boundary.
//!
//! The production deployment forwards classified failures to an external
//! error-tracking service; that client lives outside this crate. The
//! reporter here keeps the same capture interface and records events into
//! the service log so the call sites do not change when a real transport is
//! plugged in.

/// Captures request-level failures for out-of-band reporting.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    dsn: Option<String>,
}

impl ErrorReporter {
    /// Reporter configured from an optional DSN; an empty DSN disables it.
    #[must_use]
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: if dsn.is_empty() {
                None
            } else {
                Some(dsn.to_string())
            },
        }
    }

    /// Whether a DSN was configured.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.dsn.is_some()
    }

    /// Capture a failure message with the request URL it occurred on.
    pub fn capture_message(&self, message: &str, request_url: &str) {
        if self.dsn.is_some() {
            log::error!("captured error report: {message} url={request_url}");
        }
    }
}
