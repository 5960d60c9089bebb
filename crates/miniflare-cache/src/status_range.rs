// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

/// A status-code match for `cacheTtlByStatus` (§4.4): either a single code
/// (`"404"`) or an inclusive range (`"200-299"`). Malformed keys are
/// dropped by the caller rather than rejected, per the TTL derivation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub low: u16,
    pub high: u16,
}

impl StatusRange {
    pub fn parse(key: &str) -> Option<StatusRange> {
        let key = key.trim();
        if let Some((low, high)) = key.split_once('-') {
            let low: u16 = low.trim().parse().ok()?;
            let high: u16 = high.trim().parse().ok()?;
            if low > high {
                return None;
            }
            Some(StatusRange { low, high })
        } else {
            let code: u16 = key.parse().ok()?;
            Some(StatusRange { low: code, high: code })
        }
    }

    pub fn contains(&self, status: u16) -> bool {
        (self.low..=self.high).contains(&status)
    }
}

/// Parses a `cacheTtlByStatus` map, silently dropping keys that do not
/// parse as a status or status range rather than rejecting the whole map.
pub fn parse_cache_ttl_by_status(entries: &[(String, i64)]) -> Vec<(StatusRange, i64)> {
    entries.iter().filter_map(|(key, ttl)| StatusRange::parse(key).map(|range| (range, *ttl))).collect()
}

/// Looks up the TTL for `status`, first matching entry wins (map iteration
/// order as provided by the caller).
pub fn ttl_for_status(table: &[(StatusRange, i64)], status: u16) -> Option<i64> {
    table.iter().find(|(range, _)| range.contains(status)).map(|(_, ttl)| *ttl)
}
