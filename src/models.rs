// 📥 Input Models - Story, article, source and top-location shapes from the news API
//
// Upstream JSON is loosely typed: ids may be numbers, labels may be null,
// locations may be bare strings or objects. Everything here deserializes leniently
// so one odd record never rejects the whole feed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::country_index::Coordinate;
use crate::normalize::{lenient_number, lenient_string};
use crate::sources::count_distinct_sources;

/// Array of `T`, keeping the elements that parse
///
/// `null`, a non-array value or a malformed element never fails the parent:
/// non-arrays become empty, bad elements are skipped.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

// ============================================================================
// LOCATION REFERENCE
// ============================================================================

/// A story's location tag: `"France"` or `{ "name": "France", "latitude": .. }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationRef {
    Name(String),
    Place(PlaceRef),
    /// Anything else upstream sends; carries no usable name
    Other(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
}

impl LocationRef {
    /// Trimmed, non-empty display name
    pub fn name(&self) -> Option<&str> {
        let raw = match self {
            LocationRef::Name(name) => name.as_str(),
            LocationRef::Place(place) => place.name.as_deref()?,
            LocationRef::Other(_) => return None,
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    /// Explicit coordinate carried by the tag, when both axes are finite
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            LocationRef::Place(PlaceRef {
                latitude: Some(lat),
                longitude: Some(lon),
                ..
            }) => Some(Coordinate::new(*lon, *lat)),
            _ => None,
        }
    }
}

impl From<&str> for LocationRef {
    fn from(name: &str) -> Self {
        LocationRef::Name(name.to_string())
    }
}

// ============================================================================
// ARTICLE / STORY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_string")]
    pub article_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub headline: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,

    /// Remaining upstream fields (dates live here under several names)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cluster of articles about one event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Story {
    #[serde(default, deserialize_with = "lenient_string")]
    pub story_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub primary_location: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub locations: Vec<LocationRef>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub articles: Vec<Article>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub sources_count: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    /// First tagged location; the only one counted on the overview map
    pub fn primary(&self) -> Option<&LocationRef> {
        self.locations.first()
    }

    /// Upstream source count, or distinct outlets among the articles
    pub fn source_count(&self) -> usize {
        match self.sources_count {
            Some(n) if n >= 0.0 => n.round() as usize,
            _ => count_distinct_sources(&self.articles),
        }
    }
}

// ============================================================================
// SOURCES / TOP LOCATIONS
// ============================================================================

/// Outlet with its editorial bias rating
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub bias: Option<String>,
}

impl SourceRecord {
    /// `source` when non-blank, else `name`, else empty
    pub fn outlet(&self) -> &str {
        [self.source.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("")
    }
}

/// Pre-aggregated location count from the analytics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopLocation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub count: Option<f64>,
}

impl TopLocation {
    pub fn new(name: &str, count: f64) -> Self {
        TopLocation {
            name: Some(name.to_string()),
            count: Some(count),
        }
    }
}

// ============================================================================
// FEED DOCUMENT
// ============================================================================

/// Everything the map pipeline consumes in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryFeed {
    #[serde(default, deserialize_with = "lenient_list")]
    pub stories: Vec<Story>,

    #[serde(
        default,
        rename = "topLocations",
        alias = "top_locations",
        deserialize_with = "lenient_list"
    )]
    pub top_locations: Vec<TopLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_ref_shapes() {
        let locations: Vec<LocationRef> = serde_json::from_value(json!([
            "  Berlin ",
            { "name": "France", "latitude": "46.2", "longitude": 2.2 },
            { "name": "" },
            { "latitude": 1 },
            null,
            42
        ]))
        .unwrap();

        assert_eq!(locations[0].name(), Some("Berlin"));
        assert_eq!(locations[1].name(), Some("France"));
        assert_eq!(locations[1].coordinate(), Some(Coordinate::new(2.2, 46.2)));
        assert_eq!(locations[2].name(), None);
        assert_eq!(locations[3].name(), None);
        assert_eq!(locations[3].coordinate(), None);
        assert_eq!(locations[4].name(), None);
        assert_eq!(locations[5].name(), None);
    }

    #[test]
    fn test_story_lenient_fields() {
        let story: Story = serde_json::from_value(json!({
            "story_id": 17,
            "title": "Summit",
            "locations": null,
            "articles": [{ "source": "Example", "published_at": "2024-01-15T10:00:00Z" }],
            "updated_at": "2024-01-16T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(story.story_id.as_deref(), Some("17"));
        assert!(story.locations.is_empty());
        assert!(story.primary().is_none());
        assert_eq!(story.articles.len(), 1);
        assert!(story.articles[0].extra.contains_key("published_at"));
        assert!(story.extra.contains_key("updated_at"));
        assert_eq!(story.source_count(), 1);
    }

    #[test]
    fn test_story_source_count_prefers_upstream() {
        let story: Story = serde_json::from_value(json!({
            "sources_count": 4,
            "articles": [{ "source": "Example" }]
        }))
        .unwrap();
        assert_eq!(story.source_count(), 4);
    }

    #[test]
    fn test_source_outlet_fallback() {
        let record: SourceRecord =
            serde_json::from_value(json!({ "source": "  ", "name": "Daily Post", "bias": null }))
                .unwrap();
        assert_eq!(record.outlet(), "Daily Post");
        assert_eq!(record.bias, None);
        assert_eq!(SourceRecord::default().outlet(), "");
    }

    #[test]
    fn test_feed_aliases() {
        let feed: StoryFeed = serde_json::from_value(json!({
            "topLocations": [{ "name": "France", "count": "3" }, { "name": "Spain", "count": "x" }]
        }))
        .unwrap();
        assert!(feed.stories.is_empty());
        assert_eq!(feed.top_locations[0].count, Some(3.0));
        assert_eq!(feed.top_locations[1].count, None);

        let feed: StoryFeed =
            serde_json::from_value(json!({ "top_locations": [{ "name": "Fiji", "count": 1 }] })).unwrap();
        assert_eq!(feed.top_locations.len(), 1);
    }

    #[test]
    fn test_feed_skips_malformed_entries() {
        let feed: StoryFeed = serde_json::from_value(json!({
            "stories": [
                null,
                { "title": "flat", "locations": "Germany", "articles": null },
                { "title": "ok", "locations": ["Germany"], "articles": [null, { "source": "BBC" }] }
            ],
            "topLocations": null
        }))
        .unwrap();

        assert_eq!(feed.stories.len(), 2);
        assert!(feed.stories[0].locations.is_empty());
        assert!(feed.stories[0].articles.is_empty());
        assert_eq!(feed.stories[1].primary().and_then(LocationRef::name), Some("Germany"));
        assert_eq!(feed.stories[1].articles.len(), 1);
        assert!(feed.top_locations.is_empty());
    }
}
