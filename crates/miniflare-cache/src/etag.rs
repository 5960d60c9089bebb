// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

/// An entity-tag as it appears in `ETag` / `If-None-Match`, tracking
/// weakness separately from the quoted opaque tag so `W/"x"` and `"x"` can
/// be compared for the weak-equality `If-None-Match` uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    pub weak: bool,
    pub tag: String,
}

impl EntityTag {
    pub fn parse(raw: &str) -> Option<EntityTag> {
        let raw = raw.trim();
        let (weak, rest) = match raw.strip_prefix("W/") {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };
        let tag = rest.strip_prefix('"')?.strip_suffix('"')?;
        Some(EntityTag { weak, tag: tag.to_string() })
    }
}

/// Parses a comma-separated `If-None-Match` header into entity-tags,
/// tolerating the bare `*` wildcard that matches any entity.
pub enum IfNoneMatch {
    Any,
    Tags(Vec<EntityTag>),
}

impl IfNoneMatch {
    pub fn parse(raw: &str) -> IfNoneMatch {
        let raw = raw.trim();
        if raw == "*" {
            return IfNoneMatch::Any;
        }
        let tags = raw.split(',').filter_map(|part| EntityTag::parse(part.trim())).collect();
        IfNoneMatch::Tags(tags)
    }

    /// `If-None-Match` matching is weak: the tag's quoted value is compared
    /// regardless of either side's `W/` prefix.
    pub fn matches(&self, stored: &EntityTag) -> bool {
        match self {
            IfNoneMatch::Any => true,
            IfNoneMatch::Tags(tags) => tags.iter().any(|t| t.tag == stored.tag),
        }
    }
}
