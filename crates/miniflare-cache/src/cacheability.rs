// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::{Error, Result};

use crate::cache_control::CacheControl;
use crate::model::{CacheRequest, CachedResponse};

/// Rejects a `put` per §4.4's cacheability filter, returning the first
/// violation found; callers surface this as-is to user code since it is a
/// validation error, never retried.
pub fn check_cacheable(req: &CacheRequest, response: &CachedResponse, is_websocket_upgrade: bool) -> Result<()> {
    if req.method != "GET" {
        return Err(Error::NonGetRequest);
    }
    if response.status() == 206 {
        return Err(Error::Validation("Cannot cache a partial content (206) response".to_string()));
    }
    if response.status() == 101 && is_websocket_upgrade {
        return Err(Error::Validation("Cannot cache a WebSocket upgrade response".to_string()));
    }
    if response.vary_is_wildcard() {
        return Err(Error::Validation("Cannot cache a response with Vary: *".to_string()));
    }

    let cache_control = response.header("cache-control").map(CacheControl::parse).unwrap_or_default();
    if cache_control.no_store {
        return Err(Error::Validation("Cannot cache a response with Cache-Control: no-store".to_string()));
    }
    if cache_control.no_cache {
        return Err(Error::Validation("Cannot cache a response with Cache-Control: no-cache".to_string()));
    }
    if cache_control.is_bare_private() {
        return Err(Error::Validation("Cannot cache a response with Cache-Control: private".to_string()));
    }

    if response.header("set-cookie").is_some() && !cache_control.private_lists("set-cookie") {
        return Err(Error::Validation(
            "Cannot cache a response with Set-Cookie unless Cache-Control explicitly lists it under private=".to_string(),
        ));
    }

    Ok(())
}
