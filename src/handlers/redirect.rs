//! Redirect return mode: publish the patched artifact once, then 302.

use crate::adapters::storage::Storage;
use crate::attribution::query::query_unescape;
use crate::attribution::Code;
use crate::handlers::{bouncer_url, DownloadParams, StubResponse};
use crate::infra::error::{StubError, StubResult};
use crate::services::{modify_stub, SingleFlight, StubFetcher};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Storage-key product prefix for RTAMO downloads.
const RTAMO_PRODUCT_PREFIX: &str = "rtamo-";

/// Publishes patched installers to an object store and redirects to them.
pub struct RedirectHandler {
    fetcher: StubFetcher,
    storage: Arc<Storage>,
    cdn_prefix: String,
    key_prefix: String,
    bouncer_base_url: String,
    publish_group: SingleFlight<String>,
}

impl RedirectHandler {
    #[must_use]
    pub fn new(
        fetcher: StubFetcher,
        storage: Arc<Storage>,
        cdn_prefix: &str,
        key_prefix: &str,
        bouncer_base_url: &str,
    ) -> Self {
        Self {
            fetcher,
            storage,
            cdn_prefix: cdn_prefix.to_string(),
            key_prefix: key_prefix.to_string(),
            bouncer_base_url: bouncer_base_url.to_string(),
            publish_group: SingleFlight::new(),
        }
    }

    pub async fn serve_stub(
        &self,
        params: &DownloadParams,
        code: &Code,
    ) -> StubResult<StubResponse> {
        let attribution_code = code.url_encode();
        let burl = bouncer_url(
            &params.product,
            &params.lang,
            &params.os,
            &self.bouncer_base_url,
        );

        let cdn_url = self.fetcher.resolve_redirect(&burl).await?;

        let basename = cdn_url.rsplit('/').next().unwrap_or_default();
        let filename = query_unescape(basename).map_err(|e| StubError::FetchTransport {
            url: cdn_url.clone(),
            detail: format!("bad filename in resolved url: {e}"),
        })?;

        let mut product = params.product.clone();
        if code.from_rtamo() {
            product = format!("{RTAMO_PRODUCT_PREFIX}{product}");
            log::info!("updated product value in storage key for RTAMO product={product}");
        }

        let key = format!(
            "{}builds/{}/{}/{}/{}/{}",
            self.key_prefix,
            storage_path_escape(&product),
            storage_path_escape(&params.lang),
            storage_path_escape(&params.os),
            unique_key(&cdn_url, &attribution_code),
            filename
        );

        // One fetch+patch+put per storage key; concurrent requests with the
        // same fingerprint all redirect to the single published object.
        let location = {
            let fetcher = self.fetcher.clone();
            let storage = self.storage.clone();
            let os = params.os.clone();
            let cdn_url = cdn_url.clone();
            let publish_key = key.clone();
            let cdn_prefix = self.cdn_prefix.clone();
            self.publish_group
                .run(&key, async move {
                    let stub = fetcher.fetch_stub(&cdn_url).await?;
                    let stub = modify_stub(&stub, &attribution_code, &os)?;
                    storage
                        .put(&publish_key, &stub.content_type, stub.body)
                        .await?;
                    Ok(format!("{cdn_prefix}{publish_key}"))
                })
                .await?
        };

        log::info!("redirected request location={location}");

        Ok(StubResponse::Redirect { location })
    }
}

/// Collapse a key segment onto `[A-Za-z0-9]`, mapping every other rune to
/// `-` and the empty string to `-`.
#[must_use]
pub fn storage_path_escape(segment: &str) -> String {
    if segment.is_empty() {
        return "-".to_string();
    }
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Fingerprint of a download: SHA-256 over `cdnURL|encodedCode`.
#[must_use]
pub fn unique_key(download_url: &str, attribution_code: &str) -> String {
    let digest = Sha256::digest(format!("{download_url}|{attribution_code}").as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_path_escape_maps_non_alphanumerics() {
        assert_eq!(storage_path_escape("firefox-stub"), "firefox-stub");
        assert_eq!(storage_path_escape("en US/§"), "en-US--");
        assert_eq!(storage_path_escape(""), "-");
        assert_eq!(storage_path_escape("Firefox 95.0"), "Firefox-95-0");
    }

    #[test]
    fn unique_key_is_deterministic() {
        let a = unique_key("https://cdn/f.exe", "code");
        let b = unique_key("https://cdn/f.exe", "code");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(unique_key("https://cdn/f.exe", "other"), a);
        assert_ne!(unique_key("https://cdn/g.exe", "code"), a);
    }
}
