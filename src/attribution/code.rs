//! A validated attribution record.

use crate::attribution::query::{query_escape, QueryValues};
use std::sync::OnceLock;
use uuid::Uuid;

pub(crate) const DOWNLOAD_TOKEN_FIELD: &str = "dltoken";

/// Keys accepted from callers but never written into the installer.
const EXCLUDED_ATTRIBUTION_KEYS: &[&str] = &["visit_id", "session_id", "client_id", "client_id_ga4"];

const RTAMO_PREFIX: &str = "rta:";

/// A sanitized attribution code, as produced by the validator.
///
/// The raw key/value mapping is retained so serialization only has to drop
/// the excluded keys and add the download token, rather than rebuild the
/// payload from the typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub content: String,
    pub experiment: String,
    pub installer_type: String,
    pub variation: String,
    pub user_agent: String,
    pub client_id: String,
    pub client_id_ga4: String,
    pub session_id: String,
    pub download_source: String,

    pub(crate) download_token: OnceLock<String>,

    pub(crate) raw_values: QueryValues,
}

impl Code {
    /// Unique token for this download, minted on first use and stable for
    /// the lifetime of this record.
    pub fn download_token(&self) -> &str {
        self.download_token
            .get_or_init(|| Uuid::new_v4().to_string())
    }

    /// The doubly-encoded attribution string written into installers:
    /// form-encoded in ascending key order, then escaped once more as a
    /// whole.
    #[must_use]
    pub fn url_encode(&self) -> String {
        let mut values = self.raw_values.clone();
        for key in EXCLUDED_ATTRIBUTION_KEYS {
            values.del(key);
        }
        values.set(DOWNLOAD_TOKEN_FIELD, self.download_token());
        query_escape(&values.encode())
    }

    /// Whether the `content` field selects the "Return To AMO" flow.
    #[must_use]
    pub fn from_rtamo(&self) -> bool {
        self.content.starts_with(RTAMO_PREFIX)
    }

    /// The legacy `visit_id` value as received, before client-id aliasing.
    #[must_use]
    pub fn visit_id(&self) -> &str {
        self.raw_values.get("visit_id")
    }
}
