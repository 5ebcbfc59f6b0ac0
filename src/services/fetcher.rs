//! Upstream installer fetching with caching and request coalescing.
//!
//! One fetcher instance is shared by all request tasks; it owns the HTTP
//! clients, both caches and the single-flight group, so tests can stand up
//! a fresh context instead of relying on process-wide globals.

use crate::cache::{StringCache, StubCache};
use crate::infra::error::{StubError, StubResult};
use crate::services::modify::Stub;
use crate::services::singleflight::SingleFlight;
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// 1000 MB of installer bodies.
const STUB_CACHE_MAX_SIZE: u64 = 1024 * 1024 * 1000;
/// 128 MB of resolved locations.
const STRING_CACHE_MAX_SIZE: u64 = 1024 * 1024 * 128;

struct FetcherInner {
    client: reqwest::Client,
    no_redirect_client: reqwest::Client,
    stub_cache: StubCache,
    string_cache: StringCache,
    fetch_group: SingleFlight<Stub>,
}

/// Fetches installers from the upstream redirector.
#[derive(Clone)]
pub struct StubFetcher {
    inner: Arc<FetcherInner>,
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StubFetcher {
    /// Fetcher with production cache sizes and timeouts.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client build");
        let no_redirect_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("reqwest client build");

        Self {
            inner: Arc::new(FetcherInner {
                client,
                no_redirect_client,
                stub_cache: StubCache::new(STUB_CACHE_MAX_SIZE, CACHE_TTL),
                string_cache: StringCache::new(STRING_CACHE_MAX_SIZE, CACHE_TTL),
                fetch_group: SingleFlight::new(),
            }),
        }
    }

    /// Fetch the installer at `url`, serving repeat requests from the stub
    /// cache and coalescing concurrent fetches of the same URL.
    pub async fn fetch_stub(&self, url: &str) -> StubResult<Stub> {
        if let Some(stub) = self.inner.stub_cache.get(url) {
            metrics::counter!("fetch_stub.cache_hit").increment(1);
            return Ok(stub);
        }

        let this = self.clone();
        let owned_url = url.to_string();
        self.inner
            .fetch_group
            .run(url, async move { this.fetch_uncoalesced(&owned_url).await })
            .await
    }

    async fn fetch_uncoalesced(&self, url: &str) -> StubResult<Stub> {
        // A waiter that lost the insert race may arrive here just after the
        // winner populated the cache.
        if let Some(stub) = self.inner.stub_cache.get(url) {
            metrics::counter!("fetch_stub.cache_hit").increment(1);
            return Ok(stub);
        }
        metrics::counter!("fetch_stub.cache_miss").increment(1);

        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StubError::FetchTransport {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(StubError::FetchBadStatus {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let resolved_path = response.url().path().to_string();
        let filename = resolved_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| StubError::FetchRead {
                url: url.to_string(),
                detail: e.to_string(),
            })?
            .to_vec();

        let stub = Stub {
            body,
            content_type,
            filename,
        };
        self.inner.stub_cache.add(url, &stub);

        log::info!(
            "fetched stub bouncer_url={url} stub_size={} stub_url={resolved_path}",
            stub.body.len()
        );

        Ok(stub)
    }

    /// Resolve the redirect the upstream returns for `url` without
    /// following it. The Location header is cached under the same TTL as
    /// installer bodies.
    pub async fn resolve_redirect(&self, url: &str) -> StubResult<String> {
        let cache_key = format!("redirect_response:{url}");
        if let Some(location) = self.inner.string_cache.get(&cache_key) {
            metrics::counter!("redirect_response.cache_hit").increment(1);
            return Ok(location);
        }
        metrics::counter!("redirect_response.cache_miss").increment(1);

        let response = self
            .inner
            .no_redirect_client
            .get(url)
            .send()
            .await
            .map_err(|e| StubError::FetchTransport {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 302 {
            return Err(StubError::ResolveBadStatus {
                url: url.to_string(),
                status,
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if location.is_empty() {
            return Err(StubError::ResolveNoLocation {
                url: url.to_string(),
            });
        }

        log::info!("got redirect response bouncer_url={url} cdn_url={location}");
        self.inner.string_cache.add(&cache_key, &location);

        Ok(location)
    }
}
