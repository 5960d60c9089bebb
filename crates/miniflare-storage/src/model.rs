// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::Metadata;

/// A stored value: owned bytes plus the optional expiration/metadata carried
/// alongside it (§3). Readers always get a fresh clone, never a reference
/// into the store, so mutating a returned `StoredValue` can never leak back
/// into stored state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub bytes: Vec<u8>,
    /// Absolute expiration, seconds since the Unix epoch.
    pub expiration: Option<u64>,
    pub metadata: Option<Metadata>,
}

impl StoredValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, expiration: None, metadata: None }
    }

    pub fn with_expiration(mut self, expiration: Option<u64>) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        matches!(self.expiration, Some(exp) if exp <= now_secs)
    }
}

/// A byte-range request against a stored value (§4.1): `offset`/`length`
/// select `[offset, offset+length)`; `suffix` selects the last `suffix`
/// bytes. At most one of the three forms is expected to be meaningful at a
/// time, mirroring the source runtime's `{offset?, length?, suffix?}` shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub offset: Option<u64>,
    pub length: Option<u64>,
    pub suffix: Option<u64>,
}

impl KeyRange {
    /// Resolve this range against a value of the given total length into a
    /// concrete `[start, end)` byte span, or `None` if unsatisfiable.
    pub fn resolve(&self, total_len: u64) -> Option<(u64, u64)> {
        if let Some(suffix) = self.suffix {
            if suffix > total_len {
                return None;
            }
            return Some((total_len - suffix, total_len));
        }

        let start = self.offset.unwrap_or(0);
        if start > total_len {
            return None;
        }

        let end = match self.length {
            Some(len) => start.checked_add(len).unwrap_or(total_len).min(total_len),
            None => total_len,
        };

        if start > end {
            return None;
        }

        Some((start, end))
    }
}

/// A sliced read produced by [`Operator::get_range`].
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStoredValue {
    pub bytes: Vec<u8>,
    pub range_start: u64,
    pub range_end: u64,
    pub total_len: u64,
    pub expiration: Option<u64>,
    pub metadata: Option<Metadata>,
}

/// Listing options (§4.1 step-by-step algorithm).
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub exclude_prefix: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub delimiter: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub reverse: bool,
}

/// One key's descriptor as returned by a `list` call, without its value.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredKeyEntry {
    pub name: String,
    pub expiration: Option<u64>,
    pub metadata: Option<Metadata>,
}

/// An emitted list item: either a concrete key or a delimited prefix group
/// (§4.1 step 5).
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Key(StoredKeyEntry),
    DelimitedPrefix(String),
}

impl ListItem {
    /// The name used to resume a subsequent page: the key's own name, or the
    /// delimited prefix's name.
    pub fn cursor_name(&self) -> &str {
        match self {
            ListItem::Key(entry) => &entry.name,
            ListItem::DelimitedPrefix(prefix) => prefix,
        }
    }
}

/// The result of a `list` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub items: Vec<ListItem>,
    /// Opaque cursor for the next page; empty when the walk is complete.
    pub cursor: String,
}
