//! Request handling: orchestration of validation, fetching, patching and
//! the two return modes.

pub mod direct;
pub mod redirect;
pub mod routes;
pub mod service;

pub use direct::DirectHandler;
pub use redirect::RedirectHandler;
pub use service::StubService;

use crate::attribution::{Code, QueryValues};
use crate::infra::error::StubResult;

/// The `product/os/lang` triple of a download request.
#[derive(Debug, Clone, Default)]
pub struct DownloadParams {
    pub product: String,
    pub os: String,
    pub lang: String,
}

/// What a stub handler wants sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// Patched installer bytes, streamed directly.
    Direct { body: Vec<u8>, content_type: String },
    /// 302 to the published artifact.
    Redirect { location: String },
}

/// Return-mode dispatch.
pub enum StubHandler {
    Direct(DirectHandler),
    Redirect(RedirectHandler),
}

impl StubHandler {
    pub async fn serve_stub(
        &self,
        params: &DownloadParams,
        code: &Code,
    ) -> StubResult<StubResponse> {
        match self {
            StubHandler::Direct(handler) => handler.serve_stub(params, code).await,
            StubHandler::Redirect(handler) => handler.serve_stub(params, code).await,
        }
    }
}

/// Bouncer URL for a `product/lang/os` triple.
#[must_use]
pub fn bouncer_url(product: &str, lang: &str, os: &str, base_url: &str) -> String {
    let mut values = QueryValues::new();
    values.set("product", product);
    values.set("lang", lang);
    values.set("os", os);
    format!("{base_url}?{}", values.encode())
}
