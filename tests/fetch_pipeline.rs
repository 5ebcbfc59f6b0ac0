//! Fetcher behavior against a live mock upstream: caching, coalescing and
//! the failure taxonomy.

mod common;

use common::{make_signed_pe, start_upstream};
use std::sync::atomic::Ordering;
use stub_attribution::{StubError, StubFetcher};

#[tokio::test]
async fn fetch_records_body_content_type_and_filename() {
    let body = make_signed_pe();
    let upstream = start_upstream(body.clone(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let stub = fetcher.fetch_stub(&upstream.stub_url()).await.unwrap();
    assert_eq!(stub.body, body);
    assert_eq!(stub.content_type, "application/octet-stream");
    assert_eq!(stub.filename, "fake-installer.exe");
}

#[tokio::test]
async fn repeat_fetches_hit_the_cache() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let first = fetcher.fetch_stub(&upstream.stub_url()).await.unwrap();
    let second = fetcher.fetch_stub(&upstream.stub_url()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(upstream.stub_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_stub_is_a_defensive_copy() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let mut first = fetcher.fetch_stub(&upstream.stub_url()).await.unwrap();
    first.body[0] = 0xFF;
    let second = fetcher.fetch_stub(&upstream.stub_url()).await.unwrap();
    assert_eq!(second.body[0], b'M');
}

#[tokio::test]
async fn concurrent_fetches_of_one_url_issue_one_get() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let fetcher = fetcher.clone();
        let url = upstream.stub_url();
        tasks.push(tokio::spawn(
            async move { fetcher.fetch_stub(&url).await },
        ));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    assert_eq!(upstream.stub_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_rejects_non_200() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let url = format!("http://{}/missing.exe", upstream.addr);
    let err = fetcher.fetch_stub(&url).await.unwrap_err();
    assert!(matches!(
        err,
        StubError::FetchBadStatus { status: 404, .. }
    ));
}

#[tokio::test]
async fn fetch_transport_error() {
    let fetcher = StubFetcher::new();
    // nothing listens on this port
    let err = fetcher
        .fetch_stub("http://127.0.0.1:9/unreachable")
        .await
        .unwrap_err();
    assert!(matches!(err, StubError::FetchTransport { .. }));
}

#[tokio::test]
async fn resolve_returns_location_without_following() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let location = fetcher.resolve_redirect(&upstream.base_url()).await.unwrap();
    assert_eq!(location, upstream.stub_url());
    // resolving must not download the installer
    assert_eq!(upstream.stub_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_is_cached() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    fetcher.resolve_redirect(&upstream.base_url()).await.unwrap();
    fetcher.resolve_redirect(&upstream.base_url()).await.unwrap();
    assert_eq!(upstream.bouncer_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_rejects_non_302() {
    let upstream = start_upstream(make_signed_pe(), "application/octet-stream").await;
    let fetcher = StubFetcher::new();

    let err = fetcher
        .resolve_redirect(&upstream.stub_url())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StubError::ResolveBadStatus { status: 200, .. }
    ));
}
