//! Direct return mode: fetch, patch, stream back.

use crate::attribution::Code;
use crate::handlers::{bouncer_url, DownloadParams, StubResponse};
use crate::infra::error::StubResult;
use crate::services::{modify_stub, StubFetcher};

/// Serves patched installers in the response body.
pub struct DirectHandler {
    fetcher: StubFetcher,
    bouncer_base_url: String,
}

impl DirectHandler {
    #[must_use]
    pub fn new(fetcher: StubFetcher, bouncer_base_url: &str) -> Self {
        Self {
            fetcher,
            bouncer_base_url: bouncer_base_url.to_string(),
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
        let stub = self.fetcher.fetch_stub(&cdn_url).await?;
        let stub = modify_stub(&stub, &attribution_code, &params.os)?;

        Ok(StubResponse::Direct {
            body: stub.body,
            content_type: stub.content_type,
        })
    }
}
