//! End-to-end flows through the stub service: direct and redirect modes,
//! plus the degraded fallback to the bouncer.

mod common;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use common::{make_signed_pe, start_upstream, CERT_TABLE_OFFSET, MOZ_TAG, TAG_OFFSET_IN_TABLE};
use std::sync::Arc;
use std::time::Duration;
use stub_attribution::adapters::storage::{MemStorage, Storage};
use stub_attribution::handlers::{bouncer_url, StubHandler};
use stub_attribution::{
    DirectHandler, ErrorReporter, RedirectHandler, StubFetcher, StubService, Validator,
};
use warp::http::StatusCode;

fn encode_attribution(payload: &str) -> String {
    URL_SAFE.encode(payload).replace('=', ".")
}

fn direct_service(bouncer_base: &str) -> StubService {
    StubService::new(
        StubHandler::Direct(DirectHandler::new(StubFetcher::new(), bouncer_base)),
        Validator::new("", Duration::from_secs(600)),
        ErrorReporter::default(),
        bouncer_base,
    )
}

fn redirect_service(bouncer_base: &str, storage: Arc<Storage>) -> StubService {
    StubService::new(
        StubHandler::Redirect(RedirectHandler::new(
            StubFetcher::new(),
            storage,
            "https://cdn.example/",
            "test-prefix/",
            bouncer_base,
        )),
        Validator::new("", Duration::from_secs(600)),
        ErrorReporter::default(),
        bouncer_base,
    )
}

#[tokio::test]
async fn direct_mode_serves_patched_installer() {
    let original = make_signed_pe();
    let upstream = start_upstream(original.clone(), "application/octet-stream").await;
    let service = direct_service(&upstream.base_url());

    let code = encode_attribution(
        "source=www.google.com&medium=organic&campaign=(not set)&content=(not set)",
    );
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Cache-Control").unwrap(),
        "max-age=604800"
    );
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(
        response
            .headers()
            .get("Content-Length")
            .unwrap()
            .to_str()
            .unwrap(),
        original.len().to_string()
    );

    let body = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(body.len(), original.len());

    let insert_start = CERT_TABLE_OFFSET + TAG_OFFSET_IN_TABLE + MOZ_TAG.len();
    let patched = &body[insert_start..insert_start + 256];
    let text = std::str::from_utf8(&patched[..patched.iter().position(|b| *b == 0).unwrap()])
        .unwrap()
        .to_string();
    assert!(text.starts_with(
        "campaign%3D%2528not%2Bset%2529%26content%3D%2528not%2Bset%2529%26dltoken%3D"
    ));
    assert!(text.ends_with("%26medium%3Dorganic%26source%3Dwww.google.com"));

    // everything before the insert point is byte-identical
    assert_eq!(&body[..insert_start], &original[..insert_start]);
}

#[tokio::test]
async fn invalid_attribution_code_redirects_to_bouncer() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let service = direct_service(&upstream.base_url());

    let response = service
        .serve("product=test-stub&os=win&lang=en-US&attribution_code=!!!", "")
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("Location").unwrap().to_str().unwrap(),
        bouncer_url("test-stub", "en-US", "win", &upstream.base_url())
    );
}

#[tokio::test]
async fn unpatchable_stub_redirects_to_bouncer() {
    // upstream serves something that is not a PE
    let upstream = start_upstream(vec![0u8; 1024], "application/octet-stream").await;
    let service = direct_service(&upstream.base_url());

    let code = encode_attribution("source=www.google.com&medium=organic");
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("Location").unwrap().to_str().unwrap(),
        bouncer_url("test-stub", "en-US", "win", &upstream.base_url())
    );
}

#[tokio::test]
async fn unreachable_upstream_redirects_to_bouncer() {
    let service = direct_service("http://127.0.0.1:9/");

    let code = encode_attribution("source=www.google.com&medium=organic");
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("Location").unwrap().to_str().unwrap(),
        bouncer_url("test-stub", "en-US", "win", "http://127.0.0.1:9/")
    );
}

#[tokio::test]
async fn redirect_mode_publishes_and_redirects() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let storage = Arc::new(Storage::Memory(MemStorage::new()));
    let service = redirect_service(&upstream.base_url(), storage.clone());

    let code = encode_attribution(
        "source=www.google.com&medium=organic&campaign=(not set)&content=(not set)",
    );
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get("Location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://cdn.example/test-prefix/builds/test-stub/en-US/win/"));
    assert!(location.ends_with("/fake-installer.exe"));

    let Storage::Memory(memory) = &*storage else {
        panic!("memory storage expected");
    };
    assert_eq!(memory.len(), 1);
    let key = location.trim_start_matches("https://cdn.example/");
    let item = memory.get(key).expect("published object");
    assert_eq!(item.content_type, "application/octet-stream");
    assert_eq!(item.bytes.len(), make_signed_pe().len());

    // fingerprint segment is 64 hex chars
    let segments: Vec<&str> = key.split('/').collect();
    assert_eq!(segments[0], "test-prefix");
    assert_eq!(segments[1], "builds");
    let fingerprint = segments[5];
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn rtamo_publishes_under_prefixed_product() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let storage = Arc::new(Storage::Memory(MemStorage::new()));
    let service = redirect_service(&upstream.base_url(), storage.clone());

    let code = encode_attribution(
        "source=addons.mozilla.org&medium=referral&campaign=amo&content=rta:abc123",
    );
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "https://www.mozilla.org/firefox/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get("Location")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("/builds/rtamo-test-stub/"));
}

#[tokio::test]
async fn rtamo_without_mozilla_referer_redirects_to_bouncer() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let service = direct_service(&upstream.base_url());

    let code = encode_attribution(
        "source=addons.mozilla.org&medium=referral&campaign=amo&content=rta:abc123",
    );
    let query = format!("product=test-stub&os=win&lang=en-US&attribution_code={code}");
    let response = service.serve(&query, "https://attacker.example/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("Location").unwrap().to_str().unwrap(),
        bouncer_url("test-stub", "en-US", "win", &upstream.base_url())
    );
}
