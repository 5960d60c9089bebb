// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use serde_json::Value;

/// The canonical metadata tree attached to a stored key/value: `null | bool |
/// number | string | array | object` (§3).
///
/// Reuses `serde_json::Value` directly rather than a bespoke tree type: the
/// shape the spec asks for is exactly `serde_json::Value`'s shape, cloning it
/// is already a deep, non-cyclic clone (`serde_json::Value` cannot represent
/// cycles), and every consumer crate in this workspace already depends on
/// `serde_json` for its own wire/storage encoding.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Metadata(pub Value);

impl Metadata {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The JSON-encoded byte length of this metadata, used to enforce the KV
    /// engine's 1024-byte metadata ceiling (§4.5).
    pub fn encoded_len(&self) -> usize {
        // serde_json::Value serialization is infallible for any value that
        // was itself constructed from valid JSON or Rust primitives.
        serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
