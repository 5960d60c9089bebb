// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::Result;

use crate::model::{KeyRange, ListOptions, ListResult, RangeStoredValue, StoredValue};

/// The storage operator contract (§6), implemented by the in-memory [`Memory`]
/// adapter in this crate and, eventually, by out-of-tree persistent adapters
/// (file-system, Redis) that are named but not specified here.
///
/// `Operator` is object-safe so callers (the transaction manager, the cache
/// engine, the KV engine) can hold a `dyn Operator` and stay agnostic to
/// which concrete adapter backs it.
///
/// [`Memory`]: crate::Memory
pub trait Operator: Send + Sync {
    fn has(&self, key: &str) -> Result<bool>;

    fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Unsatisfiable ranges fail with [`miniflare_core::Error::RangeNotSatisfiable`].
    fn get_range(&self, key: &str, range: KeyRange) -> Result<Option<RangeStoredValue>>;

    /// Overwrites any existing entry; always clones the given bytes in.
    fn put(&self, key: &str, value: StoredValue) -> Result<()>;

    /// Returns `true` iff the key existed and was not already expired.
    fn delete(&self, key: &str) -> Result<bool>;

    fn has_many(&self, keys: &[String]) -> Result<Vec<bool>> {
        keys.iter().map(|k| self.has(k)).collect()
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<StoredValue>>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    /// Atomic with respect to concurrent batch operations on the same
    /// operator: either all entries become visible together, or (on error)
    /// none do.
    fn put_many(&self, entries: &[(String, StoredValue)]) -> Result<()>;

    /// Atomic with respect to concurrent batch operations on the same
    /// operator. Returns the number of keys that existed and were removed.
    fn delete_many(&self, keys: &[String]) -> Result<usize>;

    fn list(&self, options: ListOptions) -> Result<ListResult>;

    fn now_secs(&self) -> u64;
}
