// 🕒 Date helpers - Timestamps from loosely named upstream fields
//
// Anything unparseable is epoch 0, so undated items sort last.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::models::{Article, Story};

/// Article date fields, in priority order
pub const ARTICLE_DATE_FIELDS: &[&str] = &[
    "published_at",
    "publishedAt",
    "published_date",
    "publishedDate",
    "date",
];

/// Story date fields, in priority order
pub const STORY_DATE_FIELDS: &[&str] = &["updated_at", "generated_at"];

/// First non-empty string among `fields`
pub fn extract_date_value<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| fields.get(*name).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Milliseconds since the Unix epoch, 0 when missing or unparseable
pub fn parse_timestamp(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.timestamp_millis();
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return dt.and_utc().timestamp_millis();
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

pub fn article_timestamp(article: &Article) -> i64 {
    extract_date_value(&article.extra, ARTICLE_DATE_FIELDS)
        .map(parse_timestamp)
        .unwrap_or(0)
}

pub fn story_timestamp(story: &Story) -> i64 {
    extract_date_value(&story.extra, STORY_DATE_FIELDS)
        .map(parse_timestamp)
        .unwrap_or(0)
}

/// Newest first; ties keep input order
pub fn sort_articles_by_date(articles: &[Article]) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    sorted.sort_by_key(|a| std::cmp::Reverse(article_timestamp(a)));
    sorted
}

/// Newest first; ties keep input order
pub fn sort_stories_by_date(stories: &[Story]) -> Vec<Story> {
    let mut sorted = stories.to_vec();
    sorted.sort_by_key(|s| std::cmp::Reverse(story_timestamp(s)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), 1000);
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), 0);
        assert_eq!(parse_timestamp("1970-01-02"), 86_400_000);
        assert_eq!(parse_timestamp("1970-01-01T00:00:02.5"), 2500);
        assert_eq!(parse_timestamp("1970-01-01 00:00:03"), 3000);
    }

    #[test]
    fn test_parse_timestamp_fallback() {
        assert_eq!(parse_timestamp(""), 0);
        assert_eq!(parse_timestamp("yesterday"), 0);
        assert_eq!(parse_timestamp("2024-13-45"), 0);
    }

    #[test]
    fn test_extract_date_priority() {
        let fields = json!({ "date": "2024-01-01", "publishedAt": "2024-02-01", "published_at": "" });
        let map = fields.as_object().unwrap();
        assert_eq!(extract_date_value(map, ARTICLE_DATE_FIELDS), Some("2024-02-01"));
        assert_eq!(extract_date_value(map, STORY_DATE_FIELDS), None);
    }

    #[test]
    fn test_sort_articles_newest_first() {
        let articles: Vec<Article> = serde_json::from_value(json!([
            { "article_id": "old", "published_at": "2024-01-01T00:00:00Z" },
            { "article_id": "undated" },
            { "article_id": "new", "publishedDate": "2024-03-01" },
            { "article_id": "mid", "date": "2024-02-01T12:00:00Z" }
        ]))
        .unwrap();

        let ids: Vec<String> = sort_articles_by_date(&articles)
            .into_iter()
            .filter_map(|a| a.article_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn test_sort_stories_newest_first() {
        let stories: Vec<Story> = serde_json::from_value(json!([
            { "story_id": "a", "generated_at": "2024-01-01T00:00:00Z" },
            { "story_id": "b", "updated_at": "2024-05-01T00:00:00Z", "generated_at": "2023-01-01T00:00:00Z" },
            { "story_id": "c" },
            { "story_id": "d" }
        ]))
        .unwrap();

        let ids: Vec<String> = sort_stories_by_date(&stories)
            .into_iter()
            .filter_map(|s| s.story_id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }
}
