// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::{Error, Result};

/// Validates a key name for any KV operation (§4.5): non-empty, not `.` or
/// `..`, and within the byte ceiling. `op` names the operation for the
/// error message (`"GET"`, `"PUT"`, `"DELETE"`, `"LIST"`), matching the
/// source runtime's `"KV <OP> failed: <code>"` phrasing.
pub fn validate_key(key: &str, op: &str, max_key_bytes: usize) -> Result<()> {
    if key.is_empty() || key == "." || key == ".." {
        return Err(Error::Validation(format!("KV {op} failed: 400")));
    }
    if key.len() > max_key_bytes {
        return Err(Error::Validation(format!("KV {op} failed: 414")));
    }
    Ok(())
}

/// Validates an `expirationTtl`/`expiration` pair per §4.5: `expiration`
/// wins when both are set, each must clear the minimum and fit an `i32`.
pub fn resolve_expiration(expiration: Option<i64>, expiration_ttl: Option<i64>, now_secs: i64, min_ttl_secs: i64) -> Result<Option<u64>> {
    if let Some(expiration) = expiration {
        if expiration <= now_secs + min_ttl_secs || expiration < i32::MIN as i64 || expiration > i32::MAX as i64 {
            return Err(Error::InvalidExpiration(expiration.to_string()));
        }
        return Ok(Some(expiration as u64));
    }

    if let Some(ttl) = expiration_ttl {
        if ttl < min_ttl_secs || ttl < i32::MIN as i64 || ttl > i32::MAX as i64 {
            return Err(Error::InvalidExpirationTtl(ttl.to_string()));
        }
        return Ok(Some((now_secs + ttl) as u64));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_and_empty_key_names() {
        assert!(validate_key("", "GET", 512).is_err());
        assert!(validate_key(".", "GET", 512).is_err());
        assert!(validate_key("..", "GET", 512).is_err());
    }

    #[test]
    fn rejects_keys_over_the_byte_ceiling_with_414() {
        let long = "a".repeat(600);
        let err = validate_key(&long, "PUT", 512).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("414")));
    }

    #[test]
    fn ordinary_keys_are_fine() {
        assert!(validate_key("key1", "GET", 512).is_ok());
    }

    #[test]
    fn expiration_takes_precedence_over_ttl() {
        let result = resolve_expiration(Some(1_000_000), Some(60), 0, 60).unwrap();
        assert_eq!(result, Some(1_000_000));
    }

    #[test]
    fn ttl_below_the_minimum_is_rejected() {
        assert!(resolve_expiration(None, Some(30), 0, 60).is_err());
    }

    #[test]
    fn expiration_not_past_the_minimum_window_is_rejected() {
        assert!(resolve_expiration(Some(30), None, 0, 60).is_err());
    }

    #[test]
    fn no_expiration_fields_yields_none() {
        assert_eq!(resolve_expiration(None, None, 0, 60).unwrap(), None);
    }
}
