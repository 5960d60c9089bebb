// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;

use miniflare_core::{Error, Result};
use miniflare_storage::Operator;

use crate::engine::Cache;

/// The `CacheStorage` binding (§6): a `default` cache plus named caches
/// opened over the same storage substrate. The name `"default"` is
/// reserved for the implicit default cache.
pub struct CacheStorage {
    operator: Arc<dyn Operator>,
}

impl CacheStorage {
    pub fn new(operator: Arc<dyn Operator>) -> CacheStorage {
        CacheStorage { operator }
    }

    pub fn default_cache(&self) -> Cache {
        Cache::new(self.operator.clone(), "default")
    }

    pub fn open(&self, name: &str) -> Result<Cache> {
        if name == "default" {
            return Err(Error::ReservedNamespace(name.to_string()));
        }
        Ok(Cache::new(self.operator.clone(), name))
    }
}
