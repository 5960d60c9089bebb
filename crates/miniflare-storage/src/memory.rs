// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::collections::BTreeMap;
use std::sync::Arc;

use miniflare_core::{Clock, Error, Result, SystemClock};
use parking_lot::RwLock;

use crate::list::run_list;
use crate::model::{KeyRange, ListOptions, ListResult, RangeStoredValue, StoredValue};
use crate::operator::Operator;

const DEFAULT_MAX_BATCH_KEYS: usize = 128;

/// An in-memory [`Operator`], the reference storage adapter used by every
/// layer above it (transactions, gates, cache, KV) and by this crate's own
/// tests.
///
/// Backed by a `BTreeMap` rather than a hash map: the substrate must serve
/// ordered `list` scans directly off its snapshot, and Rust's `str`/`String`
/// `Ord` is already Unicode codepoint order, so a `BTreeMap<String, _>` gives
/// us the required comparator for free.
#[derive(Clone)]
pub struct Memory {
    data: Arc<RwLock<BTreeMap<String, StoredValue>>>,
    clock: Arc<dyn Clock>,
    max_batch_keys: usize,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").field("len", &self.data.read().len()).finish()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { data: Arc::new(RwLock::new(BTreeMap::new())), clock, max_batch_keys: DEFAULT_MAX_BATCH_KEYS }
    }

    pub fn with_max_batch_keys(mut self, max: usize) -> Self {
        self.max_batch_keys = max;
        self
    }

    fn check_batch_len(&self, len: usize) -> Result<()> {
        if len > self.max_batch_keys {
            return Err(Error::TooManyKeys { actual: len, max: self.max_batch_keys });
        }
        Ok(())
    }

    /// Opportunistically evicts `key` if it is present and expired.
    ///
    /// Deletion failure is never surfaced: this is a best-effort cleanup, not
    /// a correctness requirement, per §3's TOCTTOU-safety note. Since this
    /// adapter cannot fail to delete from its own map under its own lock,
    /// there genuinely is no failure path to ignore here, but the shape is
    /// kept so a persistent adapter's fallible opportunistic delete fits the
    /// same call site.
    fn expire_if_needed(map: &mut BTreeMap<String, StoredValue>, key: &str, now: u64) -> bool {
        if matches!(map.get(key), Some(v) if v.is_expired(now)) {
            map.remove(key);
            true
        } else {
            false
        }
    }
}

impl Operator for Memory {
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let now = self.now_secs();
        let mut map = self.data.write();
        Self::expire_if_needed(&mut map, key, now);
        Ok(map.get(key).cloned())
    }

    fn get_range(&self, key: &str, range: KeyRange) -> Result<Option<RangeStoredValue>> {
        let Some(value) = self.get(key)? else {
            return Ok(None);
        };
        let total_len = value.bytes.len() as u64;
        let Some((start, end)) = range.resolve(total_len) else {
            return Err(Error::RangeNotSatisfiable);
        };
        Ok(Some(RangeStoredValue {
            bytes: value.bytes[start as usize..end as usize].to_vec(),
            range_start: start,
            range_end: end,
            total_len,
            expiration: value.expiration,
            metadata: value.metadata,
        }))
    }

    fn put(&self, key: &str, value: StoredValue) -> Result<()> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let now = self.now_secs();
        let mut map = self.data.write();
        Self::expire_if_needed(&mut map, key, now);
        Ok(map.remove(key).is_some())
    }

    fn has_many(&self, keys: &[String]) -> Result<Vec<bool>> {
        self.check_batch_len(keys.len())?;
        let now = self.now_secs();
        let mut map = self.data.write();
        Ok(keys
            .iter()
            .map(|k| {
                Self::expire_if_needed(&mut map, k, now);
                map.contains_key(k)
            })
            .collect())
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<StoredValue>>> {
        self.check_batch_len(keys.len())?;
        let now = self.now_secs();
        let mut map = self.data.write();
        Ok(keys
            .iter()
            .map(|k| {
                Self::expire_if_needed(&mut map, k, now);
                map.get(k).cloned()
            })
            .collect())
    }

    fn put_many(&self, entries: &[(String, StoredValue)]) -> Result<()> {
        self.check_batch_len(entries.len())?;
        let mut map = self.data.write();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn delete_many(&self, keys: &[String]) -> Result<usize> {
        self.check_batch_len(keys.len())?;
        let now = self.now_secs();
        let mut map = self.data.write();
        let mut removed = 0;
        for key in keys {
            Self::expire_if_needed(&mut map, key, now);
            if map.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn list(&self, options: ListOptions) -> Result<ListResult> {
        let now = self.now_secs();
        let mut map = self.data.write();
        let expired: Vec<String> =
            map.iter().filter(|(_, v)| v.is_expired(now)).map(|(k, _)| k.clone()).collect();
        for key in &expired {
            map.remove(key);
        }
        let snapshot: Vec<(String, StoredValue)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        drop(map);
        Ok(run_list(&snapshot, &options))
    }

    fn now_secs(&self) -> u64 {
        self.clock.now_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniflare_core::TestClock;

    fn memory_with_clock() -> (Memory, Arc<TestClock>) {
        let clock = Arc::new(TestClock::new(0));
        (Memory::with_clock(clock.clone()), clock)
    }

    #[test]
    fn put_then_get_round_trips() {
        let memory = Memory::new();
        memory.put("a", StoredValue::new(b"1".to_vec())).unwrap();
        assert_eq!(memory.get("a").unwrap().unwrap().bytes, b"1");
        assert_eq!(memory.get("missing").unwrap(), None);
    }

    #[test]
    fn expired_entries_read_as_missing_and_are_evicted() {
        let (memory, clock) = memory_with_clock();
        memory.put("a", StoredValue::new(b"1".to_vec()).with_expiration(Some(10))).unwrap();
        clock.set_millis(10_000);
        assert_eq!(memory.get("a").unwrap(), None);
        assert_eq!(memory.has("a").unwrap(), false);
    }

    #[test]
    fn delete_reports_whether_key_existed() {
        let memory = Memory::new();
        assert_eq!(memory.delete("a").unwrap(), false);
        memory.put("a", StoredValue::new(vec![])).unwrap();
        assert_eq!(memory.delete("a").unwrap(), true);
    }

    #[test]
    fn get_range_slices_bytes_and_rejects_unsatisfiable_ranges() {
        let memory = Memory::new();
        memory.put("a", StoredValue::new(b"hello world".to_vec())).unwrap();

        let range = memory.get_range("a", KeyRange { offset: Some(6), length: Some(5), suffix: None }).unwrap().unwrap();
        assert_eq!(range.bytes, b"world");

        let suffix = memory.get_range("a", KeyRange { suffix: Some(5), ..Default::default() }).unwrap().unwrap();
        assert_eq!(suffix.bytes, b"world");

        let err = memory.get_range("a", KeyRange { offset: Some(100), ..Default::default() }).unwrap_err();
        assert_eq!(err, Error::RangeNotSatisfiable);
    }

    #[test]
    fn batch_operations_reject_oversized_batches() {
        let memory = Memory::new().with_max_batch_keys(2);
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = memory.has_many(&keys).unwrap_err();
        assert_eq!(err, Error::TooManyKeys { actual: 3, max: 2 });
    }

    #[test]
    fn put_many_and_delete_many_apply_atomically_from_the_readers_perspective() {
        let memory = Memory::new();
        let entries = vec![
            ("a".to_string(), StoredValue::new(b"1".to_vec())),
            ("b".to_string(), StoredValue::new(b"2".to_vec())),
        ];
        memory.put_many(&entries).unwrap();
        assert_eq!(memory.get("a").unwrap().unwrap().bytes, b"1");
        assert_eq!(memory.get("b").unwrap().unwrap().bytes, b"2");

        let removed = memory.delete_many(&["a".to_string(), "z".to_string()]).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn list_excludes_expired_keys() {
        let (memory, clock) = memory_with_clock();
        memory.put("a", StoredValue::new(vec![]).with_expiration(Some(5))).unwrap();
        memory.put("b", StoredValue::new(vec![])).unwrap();
        clock.set_millis(6_000);

        let result = memory.list(ListOptions::default()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].cursor_name(), "b");
    }
}
