// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode a cursor as `base64(utf8(last-key-name))` (§6). There is no version
/// tag; an unresolvable or undecodable cursor is never an error, it simply
/// yields an empty page (§4.1 step 4, §4.5).
pub fn encode_cursor(last_key: &str) -> String {
    STANDARD.encode(last_key.as_bytes())
}

/// Decode a cursor back into the key name it names, or `None` if it is not
/// valid base64 or not valid UTF-8 once decoded.
pub fn decode_cursor(cursor: &str) -> Option<String> {
    if cursor.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(cursor).ok()?;
    String::from_utf8(bytes).ok()
}
