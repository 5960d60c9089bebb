// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

/// A structured parse of a `Cache-Control` header (§4.4 Design Notes):
/// tokens are case-insensitive, comma-separated, each optionally
/// `token=value` with an optionally quoted value. Distinguishing bare
/// `private` from `private=set-cookie` requires this rather than substring
/// matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    /// `Some(fields)` when `private` was present; `fields` is empty for a
    /// bare `private`, or the comma-separated field list for
    /// `private="set-cookie, x-foo"`.
    pub private: Option<Vec<String>>,
    pub no_store: bool,
    pub no_cache: bool,
    pub s_maxage: Option<i64>,
    pub max_age: Option<i64>,
}

impl CacheControl {
    pub fn parse(value: &str) -> CacheControl {
        let mut cc = CacheControl::default();
        for directive in split_directives(value) {
            let (name, arg) = split_token_value(&directive);
            match name.to_ascii_lowercase().as_str() {
                "private" => cc.private = Some(parse_field_list(arg)),
                "no-store" => cc.no_store = true,
                "no-cache" => cc.no_cache = true,
                "s-maxage" => cc.s_maxage = arg.and_then(|v| v.trim().parse().ok()),
                "max-age" => cc.max_age = arg.and_then(|v| v.trim().parse().ok()),
                _ => {}
            }
        }
        cc
    }

    /// Whether `private` was present and explicitly lists `field` (the
    /// `private=set-cookie` field-listed form), as opposed to a bare
    /// `private`.
    pub fn private_lists(&self, field: &str) -> bool {
        self.private.as_ref().is_some_and(|fields| fields.iter().any(|f| f.eq_ignore_ascii_case(field)))
    }

    pub fn is_bare_private(&self) -> bool {
        matches!(&self.private, Some(fields) if fields.is_empty())
    }
}

fn split_directives(value: &str) -> Vec<String> {
    // Commas inside a quoted value must not split the directive.
    let mut directives = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in value.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                directives.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        directives.push(current);
    }
    directives.into_iter().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect()
}

fn split_token_value(directive: &str) -> (&str, Option<&str>) {
    match directive.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (directive.trim(), None),
    }
}

fn parse_field_list(arg: Option<&str>) -> Vec<String> {
    let Some(arg) = arg else { return Vec::new() };
    let unquoted = arg.trim().trim_matches('"');
    unquoted.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_bare_private_from_field_listed_private() {
        let bare = CacheControl::parse("private");
        assert!(bare.is_bare_private());
        assert!(!bare.private_lists("set-cookie"));

        let listed = CacheControl::parse("private=set-cookie");
        assert!(!listed.is_bare_private());
        assert!(listed.private_lists("set-cookie"));

        let quoted = CacheControl::parse(r#"private="set-cookie, x-foo""#);
        assert!(quoted.private_lists("set-cookie"));
        assert!(quoted.private_lists("x-foo"));
    }

    #[test]
    fn parses_max_age_and_s_maxage() {
        let cc = CacheControl::parse("max-age=5, s-maxage=10");
        assert_eq!(cc.max_age, Some(5));
        assert_eq!(cc.s_maxage, Some(10));
    }

    #[test]
    fn tokens_are_case_insensitive() {
        let cc = CacheControl::parse("NO-STORE, Private");
        assert!(cc.no_store);
        assert!(cc.is_bare_private());
    }

    #[test]
    fn no_cache_is_detected_regardless_of_an_argument() {
        let cc = CacheControl::parse("no-cache=\"set-cookie\"");
        assert!(cc.no_cache);
    }
}
