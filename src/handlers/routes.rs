//! Route table for the HTTP surface.

use crate::attribution::QueryValues;
use crate::handlers::service::{redirect, StubService};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use warp::http::Response;
use warp::hyper::Body;
use warp::Filter;

/// All service routes: the download endpoint plus the operational
/// endpoints (heartbeats, version, pingdom probe).
pub fn routes(
    service: Arc<StubService>,
    hmac_key: String,
    version_file: PathBuf,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    stub_route(service)
        .or(warp::path!("__lbheartbeat__").and(warp::get()).map(ok_reply))
        .or(warp::path!("__heartbeat__").and(warp::get()).map(ok_reply))
        .or(warp::path!("__version__")
            .and(warp::get())
            .map(move || version_reply(&version_file)))
        .or(warp::path!("__pingdom__")
            .and(warp::get())
            .map(move || pingdom_reply(&hmac_key)))
}

/// `GET /` with the raw query string and optional Referer header.
fn stub_route(
    service: Arc<StubService>,
) -> impl Filter<Extract = (Response<Body>,), Error = warp::Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .and(raw_query())
        .and(warp::header::optional::<String>("referer"))
        .and_then(move |query: String, referer: Option<String>| {
            let service = service.clone();
            async move {
                Ok::<_, Infallible>(service.serve(&query, referer.as_deref().unwrap_or("")).await)
            }
        })
}

/// The raw query string, or empty when the request has none.
fn raw_query() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::query::raw().or_else(|_| async { Ok::<(String,), warp::Rejection>((String::new(),)) })
}

fn ok_reply() -> Response<Body> {
    Response::new(Body::from("OK"))
}

fn version_reply(version_file: &Path) -> Response<Body> {
    match std::fs::read(version_file) {
        Ok(contents) => Response::builder()
            .header("Content-Type", "application/json")
            .body(Body::from(contents))
            .expect("version response build"),
        Err(err) => {
            log::error!("could not read {}: {err}", version_file.display());
            Response::builder()
                .status(warp::http::StatusCode::NOT_FOUND)
                .body(Body::from("Could not read version file."))
                .expect("version response build")
        }
    }
}

/// Synthetic download request exercising the full pipeline, for external
/// uptime probes.
fn pingdom_reply(hmac_key: &str) -> Response<Body> {
    let mut attr_query = QueryValues::new();
    attr_query.set("source", "mozilla.com");
    attr_query.set("medium", "pingdom");
    attr_query.set("campaign", "pingdom");
    attr_query.set("content", "pingdom");
    attr_query.set("experiment", "pingdom");
    attr_query.set("variation", "pingdom");
    let b64_attr_query = URL_SAFE.encode(attr_query.encode()).replace('=', ".");

    let mut query = QueryValues::new();
    query.set("product", "test-stub");
    query.set("os", "win");
    query.set("lang", "en-US");
    query.set("attribution_code", &b64_attr_query);
    if !hmac_key.is_empty() {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(hmac_key.as_bytes()).expect("hmac accepts any key size");
        mac.update(b64_attr_query.as_bytes());
        query.set("attribution_sig", &hex::encode(mac.finalize().into_bytes()));
    }

    redirect(&format!("/?{}", query.encode()))
}
