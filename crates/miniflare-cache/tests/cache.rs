// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;

use miniflare_cache::{CacheQueryOptions, CacheRequest, CacheStorage, CachedResponse};
use miniflare_core::TestClock;
use miniflare_storage::Memory;

fn cache_storage() -> (CacheStorage, Arc<TestClock>) {
    let clock = Arc::new(TestClock::new(0));
    let memory = Arc::new(Memory::with_clock(clock.clone()));
    (CacheStorage::new(memory), clock)
}

fn response(status: u16, cache_control: &str) -> CachedResponse {
    let mut r = CachedResponse::new(status, b"body".to_vec()).unwrap();
    r.set_header("cache-control", cache_control).unwrap();
    r
}

#[test]
fn cache_ttl_by_status_scenario() {
    // End-to-end scenario 1.
    let (storage, clock) = cache_storage();
    let cache = storage.default_cache();

    let by_status = vec![("200-299".to_string(), 2), ("404".to_string(), 1), ("500-599".to_string(), 0)];

    let statuses = [200u16, 201, 302, 404, 599];
    for status in statuses {
        let mut req = CacheRequest::get(format!("https://example.com/{status}"));
        req.cache_ttl_by_status = by_status.clone();
        let resp = response(status, "max-age=5");
        let result = cache.put(&req, resp, false);
        if status == 599 {
            assert!(result.is_err(), "599 has a status TTL of 0 and must not be stored");
        } else {
            result.unwrap();
        }
    }

    let check = |status: u16, expect_hit: bool| {
        let mut req = CacheRequest::get(format!("https://example.com/{status}"));
        req.cache_ttl_by_status = by_status.clone();
        let hit = cache.matches(&req, CacheQueryOptions::default()).unwrap();
        assert_eq!(hit.is_some(), expect_hit, "status {status}");
    };

    // Immediately: all but 599 (never stored) match.
    for status in [200, 201, 302, 404] {
        check(status, true);
    }

    // After 1s: 404 (ttl=1) misses.
    clock.set_millis(1_000);
    check(404, false);
    check(200, true);
    check(302, true);

    // After 2s cumulative: 200 and 201 (ttl=2) miss; 302 (falls through to
    // max-age=5) still matches.
    clock.set_millis(2_000);
    check(200, false);
    check(201, false);
    check(302, true);

    // After 5s cumulative: 302 misses.
    clock.set_millis(5_000);
    check(302, false);
}

#[test]
fn conditional_match_returns_304() {
    // End-to-end scenario 2.
    let (storage, _clock) = cache_storage();
    let cache = storage.default_cache();

    let req = CacheRequest::get("https://example.com/thing");
    let mut resp = CachedResponse::new(200, b"value".to_vec()).unwrap();
    resp.set_header("etag", "\"thing\"").unwrap();
    resp.set_header("cache-control", "max-age=60").unwrap();
    cache.put(&req, resp, false).unwrap();

    let mut conditional = CacheRequest::get("https://example.com/thing");
    conditional = conditional.with_header("if-none-match", r#""not the thing",  "thing"  , W/"still not""#);
    let hit = cache.matches(&conditional, CacheQueryOptions::default()).unwrap().unwrap();
    assert_eq!(hit.status(), 304);
}

#[test]
fn range_request_returns_206_with_content_range() {
    let (storage, _clock) = cache_storage();
    let cache = storage.default_cache();

    let req = CacheRequest::get("https://example.com/blob");
    let mut resp = CachedResponse::new(200, b"hello world".to_vec()).unwrap();
    resp.set_header("cache-control", "max-age=60").unwrap();
    cache.put(&req, resp, false).unwrap();

    let mut ranged = CacheRequest::get("https://example.com/blob");
    ranged = ranged.with_header("range", "bytes=6-10");
    let hit = cache.matches(&ranged, CacheQueryOptions::default()).unwrap().unwrap();
    assert_eq!(hit.status(), 206);
    assert_eq!(hit.body(), b"world");
    assert_eq!(hit.header("content-range"), Some("bytes 6-10/11"));
}

#[test]
fn opening_the_reserved_default_name_is_rejected() {
    let (storage, _clock) = cache_storage();
    assert!(storage.open("default").is_err());
    assert!(storage.open("images").is_ok());
}

#[test]
fn non_get_requests_are_rejected_on_put() {
    let (storage, _clock) = cache_storage();
    let cache = storage.default_cache();
    let mut req = CacheRequest::get("https://example.com/x");
    req.method = "POST".to_string();
    let resp = response(200, "max-age=5");
    assert!(cache.put(&req, resp, false).is_err());
}

#[test]
fn delete_reports_whether_an_entry_existed() {
    let (storage, _clock) = cache_storage();
    let cache = storage.default_cache();
    let req = CacheRequest::get("https://example.com/x");
    assert!(!cache.delete(&req).unwrap());

    cache.put(&req, response(200, "max-age=5"), false).unwrap();
    assert!(cache.delete(&req).unwrap());
    assert!(!cache.delete(&req).unwrap());
}
