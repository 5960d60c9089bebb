// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::collections::{HashMap, HashSet};

use miniflare_config::TransactionLimits;
use miniflare_core::{Error, Result};
use miniflare_storage::{ListOptions, ListResult, Operator, StoredValue};

use crate::version::CommitVersion;

/// A transaction's view onto the base storage (§3's `(startVersion, readSet,
/// shadow, rolledBack)` transaction state).
///
/// Every read records the touched key in [`ShadowTx::read_set`] and checks
/// the shadow map before delegating to the base operator; every write lands
/// only in the shadow map (`None` meaning a tentative delete) — the base
/// operator is never mutated until the manager validates and commits.
pub struct ShadowTx<'a> {
    base: &'a dyn Operator,
    start_version: CommitVersion,
    limits: TransactionLimits,
    read_set: HashSet<String>,
    shadow: HashMap<String, Option<StoredValue>>,
    rolled_back: bool,
}

impl<'a> ShadowTx<'a> {
    pub(crate) fn new(base: &'a dyn Operator, start_version: CommitVersion, limits: TransactionLimits) -> Self {
        Self { base, start_version, limits, read_set: HashSet::new(), shadow: HashMap::new(), rolled_back: false }
    }

    pub fn start_version(&self) -> CommitVersion {
        self.start_version
    }

    pub fn read_set(&self) -> &HashSet<String> {
        &self.read_set
    }

    pub fn write_set(&self) -> HashSet<String> {
        self.shadow.keys().cloned().collect()
    }

    pub(crate) fn shadow(&self) -> &HashMap<String, Option<StoredValue>> {
        &self.shadow
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Marks this attempt as rolled back: the manager will discard any
    /// buffered writes and return the closure's value without committing,
    /// per §4.2 phase 2.
    pub fn rollback(&mut self) {
        self.rolled_back = true;
    }

    pub fn get(&mut self, key: &str) -> Result<Option<StoredValue>> {
        self.read_set.insert(key.to_string());
        if let Some(shadowed) = self.shadow.get(key) {
            return Ok(shadowed.clone());
        }
        self.base.get(key)
    }

    pub fn has(&mut self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn put(&mut self, key: &str, value: StoredValue) -> Result<()> {
        self.validate_key_value(key, &value.bytes)?;
        self.shadow.insert(key.to_string(), Some(value));
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let existed = self.has(key)?;
        self.shadow.insert(key.to_string(), None);
        Ok(existed)
    }

    pub fn has_many(&mut self, keys: &[String]) -> Result<Vec<bool>> {
        self.check_batch_len(keys.len())?;
        keys.iter().map(|k| self.has(k)).collect()
    }

    pub fn get_many(&mut self, keys: &[String]) -> Result<Vec<Option<StoredValue>>> {
        self.check_batch_len(keys.len())?;
        keys.iter().map(|k| self.get(k)).collect()
    }

    pub fn put_many(&mut self, entries: &[(String, StoredValue)]) -> Result<()> {
        self.check_batch_len(entries.len())?;
        for (key, value) in entries {
            self.put(key, value.clone())?;
        }
        Ok(())
    }

    pub fn delete_many(&mut self, keys: &[String]) -> Result<usize> {
        self.check_batch_len(keys.len())?;
        let mut removed = 0;
        for key in keys {
            if self.delete(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Lists keys as they would appear if the shadow map's tentative writes
    /// were already committed: reads the base's full view, overlays the
    /// shadow map, then re-runs the listing algorithm against the merged
    /// set. Every key present in the result is folded into the read set, so
    /// a concurrent writer to any of them is detected as a conflict —
    /// phantom keys outside the returned page are not tracked, matching the
    /// spec's per-key `readSet` formalism (no range-lock/phantom protection
    /// is described in §4.2).
    pub fn list(&mut self, options: ListOptions) -> Result<ListResult> {
        let base_result = self.base.list(ListOptions::default())?;
        let mut merged: HashMap<String, StoredValue> = HashMap::new();
        for item in base_result.items {
            if let miniflare_storage::ListItem::Key(entry) = item {
                if let Ok(Some(value)) = self.base.get(&entry.name) {
                    merged.insert(entry.name, value);
                }
            }
        }
        for (key, shadowed) in &self.shadow {
            match shadowed {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        let mut snapshot: Vec<(String, StoredValue)> = merged.into_iter().collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        let result = miniflare_storage::internal::run_list(&snapshot, &options);
        for item in &result.items {
            self.read_set.insert(item.cursor_name().to_string());
        }
        Ok(result)
    }

    /// Prohibited inside a transaction (§4.2): always fails.
    pub fn delete_all(&mut self) -> Result<()> {
        Err(Error::InvalidTransactionState("deleteAll() is not permitted inside a transaction".into()))
    }

    /// Prohibited inside a transaction (§4.2): always fails. A `ShadowTx`
    /// has no handle back to a transaction manager, so this exists purely to
    /// give callers attempting `tx.transaction(...)` the documented error
    /// instead of a missing-method compile failure.
    pub fn transaction(&mut self) -> Result<()> {
        Err(Error::InvalidTransactionState("nested transactions are not supported".into()))
    }

    fn validate_key_value(&self, key: &str, value: &[u8]) -> Result<()> {
        if key.len() > self.limits.max_key_bytes {
            return Err(Error::KeyTooLong { len: key.len(), max: self.limits.max_key_bytes });
        }
        if value.len() > self.limits.max_value_bytes {
            return Err(Error::ValueTooLarge { actual: value.len(), max: self.limits.max_value_bytes });
        }
        Ok(())
    }

    fn check_batch_len(&self, len: usize) -> Result<()> {
        if len > self.limits.max_batch_keys {
            return Err(Error::TooManyKeys { actual: len, max: self.limits.max_batch_keys });
        }
        Ok(())
    }
}
