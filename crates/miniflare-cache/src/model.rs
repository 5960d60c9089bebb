// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use miniflare_core::{Error, Result};

/// The request side of a cache operation: the bits of an incoming `Request`
/// the cache engine reads, plus the `cf` object fields that scope TTL
/// overrides and the cache key to this one request.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    /// `cf.cacheKey`: overrides the derived cache key when set.
    pub cache_key: Option<String>,
    /// `cf.cacheTtl`.
    pub cache_ttl: Option<i64>,
    /// `cf.cacheTtlByStatus`, raw — parsed lazily since malformed keys are
    /// dropped rather than rejected.
    pub cache_ttl_by_status: Vec<(String, i64)>,
}

impl CacheRequest {
    pub fn get(url: impl Into<String>) -> CacheRequest {
        CacheRequest {
            method: "GET".to_string(),
            url: url.into(),
            headers: HeaderMap::new(),
            cache_key: None,
            cache_ttl: None,
            cache_ttl_by_status: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> CacheRequest {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The derived cache key per §4.4: `cf.cacheKey` if set, else the full
    /// URL including query. Case-sensitive either way.
    pub fn cache_key(&self) -> &str {
        self.cache_key.as_deref().unwrap_or(&self.url)
    }
}

/// Options accepted by `match`/`delete` (§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheQueryOptions {
    pub ignore_method: bool,
}

/// An HTTP response as stored in / retrieved from the cache (§9 Design
/// Notes: "model as a value type whose mutators return errors once a seal
/// flag is set"). `seal()` is called before a `match` hit is returned to
/// the caller so the cached copy can never be mutated in place.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    sealed: bool,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Result<CachedResponse> {
        let status = StatusCode::from_u16(status).map_err(|_| Error::Validation(format!("invalid status code {status}")))?;
        Ok(CachedResponse { status, headers: HeaderMap::new(), body: body.into(), sealed: false })
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether `Vary: *` appears anywhere in the header list, checked
    /// against every `Vary` occurrence rather than just the first.
    pub fn vary_is_wildcard(&self) -> bool {
        self.headers.get_all("vary").iter().filter_map(|v| v.to_str().ok()).any(|v| v.split(',').any(|tok| tok.trim() == "*"))
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        if self.sealed {
            return Err(Error::InvalidTransactionState("cannot mutate a sealed cached response".to_string()));
        }
        let name = HeaderName::try_from(name).map_err(|e| Error::Validation(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::Validation(e.to_string()))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn seal(mut self) -> CachedResponse {
        self.sealed = true;
        self
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn with_status(mut self, status: u16) -> CachedResponse {
        if let Ok(status) = StatusCode::from_u16(status) {
            self.status = status;
        }
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> CachedResponse {
        self.body = body;
        self
    }
}
