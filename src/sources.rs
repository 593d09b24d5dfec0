// 📰 Source Grouper - Collapse outlet name variants to one grouping token
//
// "The Example News", "Example", "example news" → "example"

use std::collections::{BTreeMap, BTreeSet};

use crate::bias::{classify_bias_opt, BiasCategory};
use crate::constants::SOURCE_STOPWORDS;
use crate::models::{Article, SourceRecord};
use crate::normalize::normalize_key;

/// Normalized key with every non-alphanumeric run replaced by a single space
pub fn normalize_source_key(raw: &str) -> String {
    let normalized = normalize_key(raw);
    let mut out = String::with_capacity(normalized.len());
    let mut in_gap = false;

    for c in normalized.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push(' ');
            in_gap = true;
        }
    }

    out.trim().to_string()
}

/// Grouping key: the first token that is not a stopword
///
/// Falls back to the first token when every token is a stopword.
/// Empty input gives an empty key, which never matches a populated table.
pub fn group_key(raw: &str) -> String {
    let normalized = normalize_source_key(raw);
    if normalized.is_empty() {
        return String::new();
    }

    let mut parts = normalized.split(' ').filter(|p| !p.is_empty());
    let first = parts.clone().next().unwrap_or_default();

    parts
        .find(|p| !SOURCE_STOPWORDS.contains(p))
        .unwrap_or(first)
        .to_string()
}

/// Group key → bias; the first source classified for a group wins
pub fn build_source_group_bias_map(sources: &[SourceRecord]) -> BTreeMap<String, BiasCategory> {
    let mut bias_map = BTreeMap::new();

    for source in sources {
        let Some(bias) = classify_bias_opt(source.bias.as_deref()) else {
            continue;
        };
        let key = group_key(source.outlet());
        if key.is_empty() {
            continue;
        }
        bias_map.entry(key).or_insert(bias);
    }

    bias_map
}

/// Number of distinct outlets among a story's articles
pub fn count_distinct_sources(articles: &[Article]) -> usize {
    articles
        .iter()
        .filter_map(|a| a.source.as_deref())
        .map(group_key)
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}
