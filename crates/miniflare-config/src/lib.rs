// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Tunables named by the spec as fixed limits or as "implementation-defined".
//! Every field defaults to the value the spec states, so nothing has to be
//! configured to get spec-compliant behavior out of the box.

use serde::{Deserialize, Serialize};

/// Request-context limits (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLimits {
    /// `dispatchFetch` nesting ceiling.
    pub max_request_depth: u32,
    /// Service-binding hop ceiling within one fetch.
    pub max_pipeline_depth: u32,
    /// External subrequest ceiling for "Bundled" usage model workers.
    pub external_limit_bundled: u32,
    /// External subrequest ceiling for "Unbound" usage model workers.
    pub external_limit_unbound: u32,
    /// Milliseconds each binding call advances the ambient clock by.
    pub time_advance_millis: u64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_request_depth: 16,
            max_pipeline_depth: 32,
            external_limit_bundled: 50,
            external_limit_unbound: 1000,
            time_advance_millis: 1,
        }
    }
}

/// Transaction manager limits (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionLimits {
    /// Number of recent write-sets retained for conflict validation; a
    /// transaction whose `startVersion` falls outside this window must
    /// restart unconditionally.
    pub history_window: usize,
    /// Upper bound on OCC retries before surfacing `TransactionAborted`.
    pub max_retries: u32,
    /// Durable Object storage key size ceiling, in bytes.
    pub max_key_bytes: usize,
    /// Durable Object storage value size ceiling, in bytes.
    pub max_value_bytes: usize,
    /// Maximum keys per batch operation.
    pub max_batch_keys: usize,
}

impl Default for TransactionLimits {
    fn default() -> Self {
        Self {
            history_window: 16,
            max_retries: 1000,
            max_key_bytes: 2 * 1024,
            max_value_bytes: 32 * 1024,
            max_batch_keys: 128,
        }
    }
}

/// KV namespace engine limits (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvLimits {
    pub max_key_bytes: usize,
    pub max_value_bytes: usize,
    pub max_metadata_bytes: usize,
    pub min_expiration_ttl_secs: i64,
    pub default_list_limit: usize,
    pub max_list_limit: usize,
}

impl Default for KvLimits {
    fn default() -> Self {
        Self {
            max_key_bytes: 512,
            max_value_bytes: 25 * 1024 * 1024,
            max_metadata_bytes: 1024,
            min_expiration_ttl_secs: 60,
            default_list_limit: 1000,
            max_list_limit: 1000,
        }
    }
}

/// Top-level configuration bundle, one per simulated Worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MiniflareConfig {
    #[serde(default)]
    pub request: RequestLimits,
    #[serde(default)]
    pub transaction: TransactionLimits,
    #[serde(default)]
    pub kv: KvLimits,
    /// Whether binding calls made outside a `RequestContext` should fail
    /// (§4.6's "global async I/O guard").
    #[serde(default)]
    pub block_global_async_io: bool,
}
