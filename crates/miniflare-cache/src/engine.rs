// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;

use miniflare_core::{Error, Result};
use miniflare_storage::{Operator, StoredValue};
use serde_json::json;
use tracing::debug;

use crate::cacheability::check_cacheable;
use crate::etag::{EntityTag, IfNoneMatch};
use crate::model::{CacheQueryOptions, CacheRequest, CachedResponse};
use crate::ttl::{absolute_expiration, derive_ttl_secs};

/// One named cache (§4.4): `put`/`match`/`delete` over a shared storage
/// substrate, keyed by `namespace name + derived request key`.
pub struct Cache {
    operator: Arc<dyn Operator>,
    namespace: String,
}

impl Cache {
    pub(crate) fn new(operator: Arc<dyn Operator>, namespace: impl Into<String>) -> Cache {
        Cache { operator, namespace: namespace.into() }
    }

    fn storage_key(&self, cache_key: &str) -> String {
        format!("{}\u{0}{}", self.namespace, cache_key)
    }

    pub fn put(&self, req: &CacheRequest, response: CachedResponse, is_websocket_upgrade: bool) -> Result<()> {
        check_cacheable(req, &response, is_websocket_upgrade)?;

        let now = self.operator.now_secs() as i64;
        let Some(ttl) = derive_ttl_secs(req, &response, now) else {
            return Err(Error::Validation("response is not cacheable: no TTL could be derived".to_string()));
        };

        let expiration = absolute_expiration(now, ttl).max(0) as u64;

        let headers: Vec<[String; 2]> = response
            .headers()
            .iter()
            .map(|(name, value)| [name.as_str().to_string(), value.to_str().unwrap_or_default().to_string()])
            .collect();

        let metadata = json!({
            "status": response.status(),
            "headers": headers,
            "expiration": expiration,
        });

        let key = self.storage_key(req.cache_key());
        let value = StoredValue::new(response.body().to_vec())
            .with_expiration(Some(expiration))
            .with_metadata(Some(metadata.into()));
        self.operator.put(&key, value)?;
        debug!(namespace = %self.namespace, key = %req.cache_key(), ttl, "cache put");
        Ok(())
    }

    pub fn matches(&self, req: &CacheRequest, options: CacheQueryOptions) -> Result<Option<CachedResponse>> {
        if req.method != "GET" && !options.ignore_method {
            return Ok(None);
        }

        let key = self.storage_key(req.cache_key());
        let Some(stored) = self.operator.get(&key)? else { return Ok(None) };

        let now = self.operator.now_secs();
        if stored.is_expired(now) {
            self.operator.delete(&key)?;
            return Ok(None);
        }

        let metadata = stored.metadata.as_ref().ok_or_else(|| Error::Deserialization("cache entry missing metadata".to_string()))?;
        let status = metadata.0.get("status").and_then(|v| v.as_u64()).ok_or_else(|| {
            Error::Deserialization("cache entry metadata missing status".to_string())
        })? as u16;
        let headers = metadata.0.get("headers").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut response = CachedResponse::new(status, stored.bytes.clone())?;
        for entry in &headers {
            if let Some([name, value]) = entry.as_array().and_then(|a| <[_; 2]>::try_from(a.as_slice()).ok()) {
                if let (Some(name), Some(value)) = (name.as_str(), value.as_str()) {
                    response.set_header(name, value)?;
                }
            }
        }

        if let Some(if_none_match) = req.header("if-none-match") {
            if let Some(etag) = response.header("etag").and_then(EntityTag::parse) {
                if IfNoneMatch::parse(if_none_match).matches(&etag) {
                    return Ok(Some(not_modified(response)?));
                }
            }
        } else if let Some(if_modified_since) = req.header("if-modified-since") {
            if let Some(last_modified) = response.header("last-modified") {
                if let (Ok(req_date), Ok(stored_date)) =
                    (httpdate::parse_http_date(if_modified_since), httpdate::parse_http_date(last_modified))
                {
                    if req_date >= stored_date {
                        return Ok(Some(not_modified(response)?));
                    }
                }
            }
        }

        if let Some(range) = req.header("range") {
            if let Some(mut sliced) = apply_range(&response, range)? {
                sliced.set_header("cf-cache-status", "HIT")?;
                return Ok(Some(sliced.seal()));
            }
        }

        response.set_header("cf-cache-status", "HIT")?;
        Ok(Some(response.seal()))
    }

    pub fn delete(&self, req: &CacheRequest) -> Result<bool> {
        let key = self.storage_key(req.cache_key());
        self.operator.delete(&key)
    }
}

fn not_modified(response: CachedResponse) -> Result<CachedResponse> {
    let mut not_modified = response.clone().with_status(304).with_body(Vec::new());
    not_modified.set_header("cf-cache-status", "HIT")?;
    Ok(not_modified.seal())
}

/// A single-range `Range` request (§4.4): multi-range requests fall back to
/// the full body at `200`, so `None` here means "serve as a normal hit".
fn apply_range(response: &CachedResponse, range_header: &str) -> Result<Option<CachedResponse>> {
    let spec = range_header.trim().strip_prefix("bytes=").unwrap_or(range_header.trim());
    if spec.contains(',') {
        return Ok(None);
    }
    let (start_str, end_str) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return Ok(None),
    };

    let total_len = response.body().len() as u64;
    let (start, end) = if start_str.is_empty() {
        let suffix: u64 = end_str.parse().map_err(|_| Error::RangeNotSatisfiable)?;
        if suffix > total_len {
            return Err(Error::RangeNotSatisfiable);
        }
        (total_len - suffix, total_len - 1)
    } else {
        let start: u64 = start_str.parse().map_err(|_| Error::RangeNotSatisfiable)?;
        let end: u64 = if end_str.is_empty() { total_len.saturating_sub(1) } else { end_str.parse().map_err(|_| Error::RangeNotSatisfiable)? };
        (start, end)
    };

    if start > end || start >= total_len {
        return Err(Error::RangeNotSatisfiable);
    }
    let end = end.min(total_len - 1);
    let slice = response.body()[start as usize..=end as usize].to_vec();
    let len = slice.len();

    let mut sliced = response.clone().with_status(206).with_body(slice);
    sliced.set_header("content-range", &format!("bytes {start}-{end}/{total_len}"))?;
    sliced.set_header("content-length", &len.to_string())?;
    Ok(Some(sliced))
}
