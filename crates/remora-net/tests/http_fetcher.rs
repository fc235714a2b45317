//! `HttpFetcher` against a real range-request server.

use remora_net::{FetchError, FetchOptions, Fetcher, HttpFetcher};
use remora_test_utils::{object_router, TestHttpServer};

fn test_object(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn length_via_head() {
    let server = TestHttpServer::new(object_router(test_object(1000))).await;
    let fetcher = HttpFetcher::new(FetchOptions::default());

    let len = fetcher.length(&server.url("/obj")).await.unwrap();
    assert_eq!(len, 1000);
}

#[tokio::test]
async fn fetch_range_returns_exact_slice() {
    let data = test_object(1000);
    let server = TestHttpServer::new(object_router(data.clone())).await;
    let fetcher = HttpFetcher::default();

    let bytes = fetcher.fetch_range(&server.url("/obj"), 50..150).await.unwrap();
    assert_eq!(&bytes[..], &data[50..150]);
}

#[tokio::test]
async fn fetch_from_start() {
    let data = test_object(64);
    let server = TestHttpServer::new(object_router(data.clone())).await;
    let fetcher = HttpFetcher::default();

    let bytes = fetcher.fetch_range(&server.url("/obj"), 0..64).await.unwrap();
    assert_eq!(&bytes[..], &data[..]);
}

#[tokio::test]
async fn range_past_end_is_unsatisfiable() {
    let server = TestHttpServer::new(object_router(test_object(100))).await;
    let fetcher = HttpFetcher::default();

    let err = fetcher
        .fetch_range(&server.url("/obj"), 200..300)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::RangeUnsatisfiable { .. }));
}

#[tokio::test]
async fn range_overhanging_end_is_unsatisfiable() {
    let server = TestHttpServer::new(object_router(test_object(100))).await;
    let fetcher = HttpFetcher::default();

    // Starts inside the object but runs past its end; the fetcher must
    // not silently return fewer bytes than requested.
    let err = fetcher
        .fetch_range(&server.url("/obj"), 50..150)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::RangeUnsatisfiable { .. }));
}

#[tokio::test]
async fn missing_object_is_fatal() {
    let server = TestHttpServer::new(object_router(test_object(10))).await;
    let fetcher = HttpFetcher::default();

    let err = fetcher
        .fetch_range(&server.url("/nope"), 0..5)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Fatal { status: 404, .. }));
}
