// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::{Error, Metadata, Result};

/// A value accepted by `put` (§4.5). The source runtime duck-types its
/// input (byte array, string, or stream); a strongly-typed Rust API makes
/// the disallowed shapes unrepresentable instead of raising a `TypeError`
/// for them at runtime.
#[derive(Debug, Clone)]
pub enum KvPutValue {
    Bytes(Vec<u8>),
    Text(String),
}

impl KvPutValue {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            KvPutValue::Bytes(b) => b,
            KvPutValue::Text(s) => s.into_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KvPutValue::Bytes(b) => b.len(),
            KvPutValue::Text(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The decoding requested from `get`/`getWithMetadata` (§4.5). `Stream`
/// carries the same bytes as `ArrayBuffer`: this engine has no chunked I/O
/// layer for a simulated single-process store to stream through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetType {
    #[default]
    Text,
    Json,
    ArrayBuffer,
    Stream,
}

/// The decoded value of a successful `get`. `Option<KvValue>` already
/// distinguishes "not found" (`None`) from a stored empty value
/// (`Some(KvValue::Bytes(vec![]))` or `Some(KvValue::Text(String::new()))`),
/// which is the sentinel behaviour §4.5 asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub expiration: Option<i64>,
    pub expiration_ttl: Option<i64>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    pub get_type: GetType,
    /// Validated against the minimum TTL but otherwise ignored: this engine
    /// has no local caching layer to honor it with.
    pub cache_ttl: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct KvListOptions {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// One entry in a `list` page.
#[derive(Debug, Clone, PartialEq)]
pub struct KvKeyInfo {
    pub name: String,
    pub expiration: Option<u64>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvListResult {
    pub keys: Vec<KvKeyInfo>,
    pub list_complete: bool,
    pub cursor: String,
}

pub(crate) fn decode_value(bytes: Vec<u8>, get_type: GetType) -> Result<KvValue> {
    match get_type {
        GetType::Text => Ok(KvValue::Text(String::from_utf8(bytes).map_err(|e| Error::Deserialization(e.to_string()))?)),
        GetType::Json => {
            let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
            Ok(KvValue::Json(value))
        }
        GetType::ArrayBuffer | GetType::Stream => Ok(KvValue::Bytes(bytes)),
    }
}
