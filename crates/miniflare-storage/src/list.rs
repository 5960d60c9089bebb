// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use crate::cursor::decode_cursor;
use crate::model::{ListItem, ListOptions, ListResult, StoredKeyEntry, StoredValue};

/// Runs the listing algorithm (§4.1 steps 2-6) over an already
/// non-expired, name-sorted-ascending snapshot.
///
/// Re-derives the full (unbounded) sequence of emitted items — ordinary keys
/// interleaved with delimited-prefix markers — on every call rather than
/// caching it, per §4.5's "the list is re-scanned each call, not
/// snapshot-isolated" requirement: a key inserted between two paginated calls
/// must be visible to a later page if it sorts after the cursor.
///
/// Cursor resolution is done against this same emitted-item sequence (not
/// against the raw key set) by exact name match: this is what makes a cursor
/// landing exactly on a delimited-prefix marker resume correctly, without
/// re-emitting the keys already folded into that marker on the prior page. A
/// cursor naming a key that no longer exists, and does not reappear as any
/// item's name in the current sequence, is unresolvable and yields an empty
/// page, per §4.1 step 4.
pub fn run_list(sorted_ascending: &[(String, StoredValue)], options: &ListOptions) -> ListResult {
    let prefix = options.prefix.clone().unwrap_or_default();

    let filtered: Vec<&(String, StoredValue)> = sorted_ascending
        .iter()
        .filter(|(name, _)| name.starts_with(&prefix))
        .filter(|(name, _)| match &options.exclude_prefix {
            Some(ex) if !ex.is_empty() => !name.starts_with(ex.as_str()),
            _ => true,
        })
        .filter(|(name, _)| match &options.start {
            Some(start) => name.as_str() >= start.as_str(),
            None => true,
        })
        .filter(|(name, _)| match &options.end {
            Some(end) => name.as_str() < end.as_str(),
            None => true,
        })
        .collect();

    let sequence = build_sequence(&filtered, &prefix, options.delimiter.as_deref());

    let sequence: Vec<ListItem> = if options.reverse {
        let mut rev = sequence;
        rev.reverse();
        rev
    } else {
        sequence
    };

    let start_idx = match &options.cursor {
        None => 0,
        Some(raw) if raw.is_empty() => 0,
        Some(raw) => match decode_cursor(raw) {
            None => return ListResult::default(),
            Some(name) => match sequence.iter().position(|item| item.cursor_name() == name) {
                Some(pos) => pos + 1,
                None => return ListResult::default(),
            },
        },
    };

    let remaining = &sequence[start_idx.min(sequence.len())..];
    let limit = options.limit.unwrap_or(remaining.len()).min(remaining.len());
    let page = &remaining[..limit];

    let cursor = if limit < remaining.len() {
        encode_cursor_for(&page[page.len() - 1])
    } else {
        String::new()
    };

    ListResult { items: page.to_vec(), cursor }
}

fn encode_cursor_for(item: &ListItem) -> String {
    crate::cursor::encode_cursor(item.cursor_name())
}

/// Walks the already-filtered, ascending-sorted slice, grouping keys that
/// share a delimited prefix into a single [`ListItem::DelimitedPrefix`] per
/// group (§4.1 step 5).
fn build_sequence(filtered: &[&(String, StoredValue)], prefix: &str, delimiter: Option<&str>) -> Vec<ListItem> {
    let mut out = Vec::with_capacity(filtered.len());
    let mut skip_prefix: Option<String> = None;

    for (name, value) in filtered {
        if let Some(ref grp) = skip_prefix {
            if name.starts_with(grp.as_str()) {
                continue;
            }
            skip_prefix = None;
        }

        if let Some(delim) = delimiter {
            if !delim.is_empty() {
                let suffix = &name[prefix.len().min(name.len())..];
                if let Some(idx) = suffix.find(delim) {
                    let group = format!("{prefix}{}", &suffix[..idx + delim.len()]);
                    out.push(ListItem::DelimitedPrefix(group.clone()));
                    skip_prefix = Some(group);
                    continue;
                }
            }
        }

        out.push(ListItem::Key(StoredKeyEntry {
            name: name.clone(),
            expiration: value.expiration,
            metadata: value.metadata.clone(),
        }));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<(String, StoredValue)> {
        names.iter().map(|n| (n.to_string(), StoredValue::new(vec![]))).collect()
    }

    #[test]
    fn paginates_with_cursor() {
        let data = entries(&["key1", "key2", "key3"]);

        let page1 = run_list(&data, &ListOptions { limit: Some(1), ..Default::default() });
        assert_eq!(page1.items.len(), 1);
        assert_eq!(page1.items[0].cursor_name(), "key1");
        assert!(!page1.cursor.is_empty());

        let page2 = run_list(
            &data,
            &ListOptions { limit: Some(2), cursor: Some(page1.cursor), ..Default::default() },
        );
        assert_eq!(page2.items.len(), 2);
        assert_eq!(page2.items[0].cursor_name(), "key2");
        assert_eq!(page2.items[1].cursor_name(), "key3");
        assert_eq!(page2.cursor, "");
    }

    #[test]
    fn mid_walk_insertion_is_visible_on_next_page() {
        let mut data = entries(&["key1", "key3", "key5"]);
        let page1 = run_list(&data, &ListOptions { limit: Some(2), ..Default::default() });
        assert_eq!(
            page1.items.iter().map(|i| i.cursor_name()).collect::<Vec<_>>(),
            vec!["key1", "key3"]
        );

        data.extend(entries(&["key2", "key4"]));
        data.sort_by(|a, b| a.0.cmp(&b.0));

        let page2 = run_list(
            &data,
            &ListOptions { limit: Some(2), cursor: Some(page1.cursor), ..Default::default() },
        );
        assert_eq!(
            page2.items.iter().map(|i| i.cursor_name()).collect::<Vec<_>>(),
            vec!["key4", "key5"]
        );
    }

    #[test]
    fn invalid_cursor_yields_empty_page_not_an_error() {
        let data = entries(&["key1"]);
        let result = run_list(&data, &ListOptions { cursor: Some("not valid base64!!".into()), ..Default::default() });
        assert_eq!(result, ListResult::default());
    }

    #[test]
    fn delimiter_groups_keys_and_cursor_resumes_past_the_group() {
        let data = entries(&["a/1", "a/2", "b", "c/1"]);
        let page1 = run_list(
            &data,
            &ListOptions { delimiter: Some("/".into()), limit: Some(1), ..Default::default() },
        );
        assert_eq!(page1.items, vec![ListItem::DelimitedPrefix("a/".into())]);

        let page2 = run_list(
            &data,
            &ListOptions { delimiter: Some("/".into()), cursor: Some(page1.cursor), ..Default::default() },
        );
        let names: Vec<&str> = page2.items.iter().map(|i| i.cursor_name()).collect();
        assert_eq!(names, vec!["b", "c/"]);
    }

    #[test]
    fn prefix_and_half_open_start_end_compose() {
        let data = entries(&["a1", "a2", "a3", "b1"]);
        let result = run_list(
            &data,
            &ListOptions { prefix: Some("a".into()), start: Some("a2".into()), end: Some("a3".into()), ..Default::default() },
        );
        assert_eq!(result.items.iter().map(|i| i.cursor_name()).collect::<Vec<_>>(), vec!["a2"]);
    }
}
