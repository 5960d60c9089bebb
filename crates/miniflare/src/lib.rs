// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! A local simulator of the Workers runtime (§1): the storage substrate, OCC
//! transaction manager, Durable Object input/output gates, ambient request
//! context, HTTP cache engine, and KV namespace engine, wired together
//! behind the binding surface a user script sees (§6).

pub use durable_object::DurableObjectStorage;

mod durable_object;

pub use miniflare_cache::{Cache, CacheQueryOptions, CacheRequest, CacheStorage, CachedResponse};
pub use miniflare_config::{KvLimits, MiniflareConfig, RequestLimits, TransactionLimits};
pub use miniflare_context::{ConcurrencyTier, RequestContext, SubrequestKind};
pub use miniflare_core::{Clock, Error, Metadata, Result, SystemClock, TestClock};
pub use miniflare_gates::DurableObjectGates;
pub use miniflare_kv::{
    GetOptions, GetType, KvKeyInfo, KvListOptions, KvListResult, KvNamespace, KvPutValue, KvValue, PutOptions,
};
pub use miniflare_storage::{ListOptions, Memory, Operator, StoredValue};
pub use miniflare_transaction::OptimisticTransactionManager;
