// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use crate::cache_control::CacheControl;
use crate::model::{CacheRequest, CachedResponse};
use crate::status_range::{parse_cache_ttl_by_status, ttl_for_status};

/// Derives the TTL (seconds) to store a response for, following the
/// priority chain in §4.4. Returns `None` when nothing in the chain yields
/// a cacheable TTL, including the explicit "status/request TTL of exactly
/// zero means do not cache" resolution from §9's open questions.
///
/// `now_secs` anchors the `Expires` branch, which is an absolute point in
/// time on the wire and must be converted to a duration before it can be
/// treated like every other entry in the chain.
pub fn derive_ttl_secs(req: &CacheRequest, response: &CachedResponse, now_secs: i64) -> Option<i64> {
    let by_status = parse_cache_ttl_by_status(&req.cache_ttl_by_status);
    if let Some(ttl) = ttl_for_status(&by_status, response.status()) {
        return if ttl == 0 { None } else { Some(ttl) };
    }

    if let Some(ttl) = req.cache_ttl {
        return if ttl == 0 { None } else { Some(ttl) };
    }

    let cache_control = response.header("cache-control").map(CacheControl::parse).unwrap_or_default();
    if let Some(s_maxage) = cache_control.s_maxage {
        return Some(s_maxage);
    }
    if let Some(max_age) = cache_control.max_age {
        return Some(max_age);
    }

    if let Some(expires) = response.header("expires") {
        if let Ok(when) = httpdate::parse_http_date(expires) {
            if let Ok(secs_from_epoch) = when.duration_since(std::time::UNIX_EPOCH) {
                let ttl = secs_from_epoch.as_secs() as i64 - now_secs;
                return if ttl <= 0 { None } else { Some(ttl) };
            }
        }
    }

    None
}

/// Absolute expiration is `floor(currentTime) + ttl`, expressed relative to
/// the caller-supplied current time so it composes with the simulated
/// clock rather than the wall clock.
pub fn absolute_expiration(now_secs: i64, ttl_secs: i64) -> i64 {
    now_secs + ttl_secs
}
