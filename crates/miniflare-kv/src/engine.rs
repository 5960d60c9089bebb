// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;

use miniflare_config::KvLimits;
use miniflare_core::{Error, Result};
use miniflare_storage::{ListOptions as StorageListOptions, Operator, StoredValue};
use tracing::debug;

use crate::model::{decode_value, GetOptions, KvKeyInfo, KvListOptions, KvListResult, KvPutValue, KvValue, PutOptions};
use crate::validation::{resolve_expiration, validate_key};

/// One KV namespace (§4.5), backed by the same [`Operator`] substrate the
/// transaction manager and cache engine use.
pub struct KvNamespace {
    operator: Arc<dyn Operator>,
    limits: KvLimits,
}

impl KvNamespace {
    pub fn new(operator: Arc<dyn Operator>, limits: KvLimits) -> KvNamespace {
        KvNamespace { operator, limits }
    }

    pub fn get(&self, key: &str, options: GetOptions) -> Result<Option<KvValue>> {
        validate_key(key, "GET", self.limits.max_key_bytes)?;
        if let Some(cache_ttl) = options.cache_ttl {
            if cache_ttl < self.limits.min_expiration_ttl_secs {
                return Err(Error::InvalidExpirationTtl(cache_ttl.to_string()));
            }
        }
        let Some(stored) = self.operator.get(key)? else { return Ok(None) };
        if stored.is_expired(self.operator.now_secs()) {
            return Ok(None);
        }
        Ok(Some(decode_value(stored.bytes, options.get_type)?))
    }

    pub fn get_with_metadata(&self, key: &str, options: GetOptions) -> Result<Option<(KvValue, Option<miniflare_core::Metadata>)>> {
        validate_key(key, "GET", self.limits.max_key_bytes)?;
        let Some(stored) = self.operator.get(key)? else { return Ok(None) };
        if stored.is_expired(self.operator.now_secs()) {
            return Ok(None);
        }
        let metadata = stored.metadata.clone();
        Ok(Some((decode_value(stored.bytes, options.get_type)?, metadata)))
    }

    pub fn put(&self, key: &str, value: KvPutValue, options: PutOptions) -> Result<()> {
        validate_key(key, "PUT", self.limits.max_key_bytes)?;

        if value.len() > self.limits.max_value_bytes {
            return Err(Error::ValueTooLarge { actual: value.len(), max: self.limits.max_value_bytes });
        }
        if let Some(metadata) = &options.metadata {
            let encoded_len = metadata.encoded_len();
            if encoded_len > self.limits.max_metadata_bytes {
                return Err(Error::MetadataTooLarge { actual: encoded_len, max: self.limits.max_metadata_bytes });
            }
        }

        let now = self.operator.now_secs() as i64;
        let expiration =
            resolve_expiration(options.expiration, options.expiration_ttl, now, self.limits.min_expiration_ttl_secs)?;

        let stored = StoredValue::new(value.into_bytes()).with_expiration(expiration).with_metadata(options.metadata);
        self.operator.put(key, stored)?;
        debug!(key, expiration, "kv put");
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key, "DELETE", self.limits.max_key_bytes)?;
        self.operator.delete(key)
    }

    pub fn list(&self, options: KvListOptions) -> Result<KvListResult> {
        let limit = options.limit.unwrap_or(self.limits.default_list_limit).clamp(1, self.limits.max_list_limit);

        let storage_options =
            StorageListOptions { prefix: options.prefix, limit: Some(limit), cursor: options.cursor, ..Default::default() };
        let result = self.operator.list(storage_options)?;

        let keys = result
            .items
            .into_iter()
            .filter_map(|item| match item {
                miniflare_storage::ListItem::Key(entry) => Some(KvKeyInfo { name: entry.name, expiration: entry.expiration, metadata: entry.metadata }),
                miniflare_storage::ListItem::DelimitedPrefix(_) => None,
            })
            .collect();

        Ok(KvListResult { keys, list_complete: result.cursor.is_empty(), cursor: result.cursor })
    }
}
