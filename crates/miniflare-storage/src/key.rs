// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use miniflare_core::{Error, Result};

/// The storage substrate's key-name invariants (§3): non-empty UTF-8, never
/// `.` or `..`. The substrate itself imposes no length ceiling (callers such
/// as the KV engine layer their own 512-byte limit on top, per §4.5).
pub fn validate_key_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::EmptyKey);
    }
    if name == "." || name == ".." {
        return Err(Error::ReservedKeyName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_dot_names() {
        assert_eq!(validate_key_name(""), Err(Error::EmptyKey));
        assert_eq!(validate_key_name("."), Err(Error::ReservedKeyName));
        assert_eq!(validate_key_name(".."), Err(Error::ReservedKeyName));
    }

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_key_name("a").is_ok());
        assert!(validate_key_name("a.b..c").is_ok());
        assert!(validate_key_name("...").is_ok());
    }
}
